//! Experience, levels, and the upgrade catalog.
//!
//! [`ProgressionEngine`] owns every progression counter.  It is plain data:
//! the Bevy systems at the bottom of this file only feed it XP, hand it the
//! player's [`PlayerStats`], and forward what it produces.
//!
//! ## Flow
//!
//! ```text
//! XP orb / kill ──► gain_xp ──► level-up step(s) ──► pending_selections += n
//!                                                      │
//!            GameState::LevelUp ◄── prepare_options ◄──┘
//!                     │
//!     SelectUpgradeRequest ──► select_upgrade ──► UpgradePropagation messages
//! ```
//!
//! Notifications for the HUD are queued in an outbox and drained once per
//! frame into [`ProgressionEvent`] messages, in the order they happened.

use crate::config::{GameConfig, GameRng};
use crate::constants::*;
use crate::error::{Diagnostics, GameError, GameResult};
use crate::events::HealthChanged;
use crate::health::Health;
use crate::menu::GameState;
use crate::player::{DodgeController, Player, PlayerMovement};
use crate::stats::PlayerStats;
use crate::weapon::{spawn_weapon, WeaponInstance, WeaponSlot};
use bevy::prelude::*;
use rand::Rng;
use std::collections::{BTreeSet, HashMap};

// ── Upgrade catalog ───────────────────────────────────────────────────────────

/// Weapons that can be unlocked and upgraded through the level-up panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeaponId {
    Paku,
    Keris,
    BukuMantra,
    BonekaSantet,
}

impl WeaponId {
    /// Candidate order used when building the option pool.
    pub const ALL: [WeaponId; 4] = [
        WeaponId::BonekaSantet,
        WeaponId::BukuMantra,
        WeaponId::Keris,
        WeaponId::Paku,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            WeaponId::Paku => "Paku",
            WeaponId::Keris => "Keris",
            WeaponId::BukuMantra => "Buku Mantra",
            WeaponId::BonekaSantet => "Boneka Santet",
        }
    }
}

/// Closed set of progression options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpgradeKind {
    MaxHp,
    Strength,
    Intelligence,
    Wisdom,
    Speed,
    Luck,
    DodgeCount,
    UnlockWeapon(WeaponId),
    UpgradeWeapon(WeaponId),
}

impl UpgradeKind {
    pub const STATS: [UpgradeKind; 7] = [
        UpgradeKind::MaxHp,
        UpgradeKind::Strength,
        UpgradeKind::Intelligence,
        UpgradeKind::Wisdom,
        UpgradeKind::Speed,
        UpgradeKind::Luck,
        UpgradeKind::DodgeCount,
    ];
}

/// One option on the level-up panel.  Built on demand, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeCatalogEntry {
    pub name: String,
    pub description: String,
    pub kind: UpgradeKind,
}

impl UpgradeCatalogEntry {
    pub fn for_kind(kind: UpgradeKind) -> Self {
        let (name, description) = match kind {
            UpgradeKind::MaxHp => (
                "Max HP Up".to_string(),
                format!("Increase max HP by {MAX_HP_UPGRADE_AMOUNT}"),
            ),
            UpgradeKind::Strength => (
                "Strength Up".to_string(),
                "Increase strength by 20%".to_string(),
            ),
            UpgradeKind::Intelligence => (
                "Intelligence Up".to_string(),
                "Increase intelligence by 20%".to_string(),
            ),
            UpgradeKind::Wisdom => (
                "Wisdom Up".to_string(),
                "Increase wisdom by 20%".to_string(),
            ),
            UpgradeKind::Speed => (
                "Speed Up".to_string(),
                "Increase movement speed by 15%".to_string(),
            ),
            UpgradeKind::Luck => ("Luck Up".to_string(), "Increase luck by 5%".to_string()),
            UpgradeKind::DodgeCount => (
                "Dodge Up".to_string(),
                "Increase dodge count by 1".to_string(),
            ),
            UpgradeKind::UnlockWeapon(w) => (
                format!("New Weapon: {}", w.display_name()),
                format!("Unlock {}", w.display_name()),
            ),
            UpgradeKind::UpgradeWeapon(w) => (
                format!("Upgrade {}", w.display_name()),
                format!("Upgrade {} weapon", w.display_name()),
            ),
        };
        Self {
            name,
            description,
            kind,
        }
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// HUD-facing progression notifications, delivered in the order they occurred.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum ProgressionEvent {
    XpGained(f32),
    /// `current_xp / xp_required`, clamped to `[0, 1]`.
    XpProgressChanged(f32),
    LevelChanged(u32),
    LevelUp(u32),
    WeaponUnlocked(WeaponId),
}

/// The level-up panel's callback: apply this entry.
#[derive(Message, Debug, Clone)]
pub struct SelectUpgradeRequest {
    pub entry: UpgradeCatalogEntry,
}

/// A side effect of a selected upgrade that lands outside the stat block.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum UpgradePropagation {
    HealthIncreased(f32),
    MoveSpeed(f32),
    DodgeCharges(u32),
    RangedDamageMultiplier(f32),
    RangedFireRateMultiplier(f32),
    CriticalChance(f32),
    MeleeDamageMultiplier(f32),
    SpawnWeapon(WeaponId),
    WeaponUpgraded { weapon: WeaponId, level: u32 },
}

// ── Engine ────────────────────────────────────────────────────────────────────

#[derive(Resource, Debug, Clone)]
pub struct ProgressionEngine {
    level: u32,
    current_xp: f32,
    xp_required: f32,
    base_xp: f32,
    growth_rate: f32,
    max_level: u32,
    max_upgrade_level: u32,
    unlocked: BTreeSet<WeaponId>,
    upgrade_levels: HashMap<UpgradeKind, u32>,
    pending_selections: u32,
    options: Vec<UpgradeCatalogEntry>,
    outbox: Vec<ProgressionEvent>,
}

impl Default for ProgressionEngine {
    fn default() -> Self {
        Self::new(BASE_XP_REQUIRED, XP_GROWTH_RATE, MAX_LEVEL, MAX_UPGRADE_LEVEL)
    }
}

impl ProgressionEngine {
    pub fn new(base_xp: f32, growth_rate: f32, max_level: u32, max_upgrade_level: u32) -> Self {
        Self {
            level: 1,
            current_xp: 0.0,
            xp_required: base_xp,
            base_xp,
            growth_rate,
            max_level: max_level.max(1),
            max_upgrade_level,
            unlocked: BTreeSet::new(),
            upgrade_levels: HashMap::new(),
            pending_selections: 0,
            options: Vec::new(),
            outbox: Vec::new(),
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(
            config.base_xp_required,
            config.xp_growth_rate,
            config.max_level,
            config.max_upgrade_level,
        )
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn current_xp(&self) -> f32 {
        self.current_xp
    }

    pub fn xp_required(&self) -> f32 {
        self.xp_required
    }

    /// `base × growth^(level − 1)`.
    pub fn xp_required_for(&self, level: u32) -> f32 {
        self.base_xp * self.growth_rate.powi(level.saturating_sub(1) as i32)
    }

    pub fn xp_ratio(&self) -> f32 {
        if self.xp_required <= 0.0 {
            return 1.0;
        }
        (self.current_xp / self.xp_required).clamp(0.0, 1.0)
    }

    pub fn is_unlocked(&self, weapon: WeaponId) -> bool {
        self.unlocked.contains(&weapon)
    }

    /// Times `kind` has been selected; absent entries count as 0.
    pub fn upgrade_level(&self, kind: UpgradeKind) -> u32 {
        self.upgrade_levels.get(&kind).copied().unwrap_or(0)
    }

    pub fn pending_selections(&self) -> u32 {
        self.pending_selections
    }

    /// Options currently on offer; empty when no selection is pending.
    pub fn options(&self) -> &[UpgradeCatalogEntry] {
        &self.options
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, ProgressionEvent> {
        self.outbox.drain(..)
    }

    /// Add XP and resolve every level-up it pays for.
    ///
    /// Negative or non-finite amounts are treated as zero.  At the level cap
    /// the XP keeps accumulating but no longer converts.
    pub fn gain_xp(&mut self, amount: f32) {
        let amount = if amount.is_finite() {
            amount.max(0.0)
        } else {
            0.0
        };
        self.current_xp += amount;
        self.outbox.push(ProgressionEvent::XpGained(amount));

        while self.current_xp >= self.xp_required && self.level < self.max_level {
            self.current_xp = (self.current_xp - self.xp_required).max(0.0);
            self.level += 1;
            self.xp_required = self.xp_required_for(self.level);
            self.pending_selections += 1;
            self.outbox.push(ProgressionEvent::LevelChanged(self.level));
            self.outbox.push(ProgressionEvent::LevelUp(self.level));
            info!("Level up! Now level {}", self.level);
        }

        self.outbox
            .push(ProgressionEvent::XpProgressChanged(self.xp_ratio()));
    }

    fn check_eligible(&self, kind: UpgradeKind) -> Result<(), &'static str> {
        let count = self.upgrade_level(kind);
        match kind {
            UpgradeKind::UnlockWeapon(w) if self.is_unlocked(w) => Err("weapon already unlocked"),
            UpgradeKind::UnlockWeapon(_) => Ok(()),
            UpgradeKind::UpgradeWeapon(w) if !self.is_unlocked(w) => Err("weapon not unlocked"),
            _ if count >= self.max_upgrade_level => Err("upgrade already at cap"),
            _ => Ok(()),
        }
    }

    pub fn is_eligible(&self, kind: UpgradeKind) -> bool {
        self.check_eligible(kind).is_ok()
    }

    /// Every eligible kind: stats first, then unlocks, then weapon upgrades.
    pub fn eligible_candidates(&self) -> Vec<UpgradeKind> {
        UpgradeKind::STATS
            .into_iter()
            .chain(WeaponId::ALL.into_iter().map(UpgradeKind::UnlockWeapon))
            .chain(WeaponId::ALL.into_iter().map(UpgradeKind::UpgradeWeapon))
            .filter(|&kind| self.is_eligible(kind))
            .collect()
    }

    /// Shuffle the eligible pool (Fisher–Yates) and take the first three.
    pub fn generate_upgrade_options<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Vec<UpgradeCatalogEntry> {
        let mut pool = self.eligible_candidates();
        let n = pool.len();
        for i in 0..n {
            let j = rng.gen_range(i..n);
            pool.swap(i, j);
        }
        pool.into_iter()
            .take(UPGRADE_OPTION_COUNT)
            .map(UpgradeCatalogEntry::for_kind)
            .collect()
    }

    /// Fill [`Self::options`] for the next pending selection, if any.
    ///
    /// When every kind is capped or unlocked there is nothing left to offer:
    /// the pending selections are dropped and their count returned.
    pub fn prepare_options<R: Rng + ?Sized>(&mut self, rng: &mut R) -> u32 {
        if self.pending_selections == 0 || !self.options.is_empty() {
            return 0;
        }
        self.options = self.generate_upgrade_options(rng);
        if !self.options.is_empty() {
            return 0;
        }
        std::mem::take(&mut self.pending_selections)
    }

    /// Apply a level-up choice.
    ///
    /// Always consumes one pending selection.  Ineligible requests leave every
    /// counter untouched and come back as `InvalidUpgradeRequest`.  Stat kinds
    /// without a stat block still advance their counter; the missing stats are
    /// reported to `diagnostics`.
    pub fn select_upgrade(
        &mut self,
        entry: &UpgradeCatalogEntry,
        stats: Option<&mut PlayerStats>,
        diagnostics: &mut Diagnostics,
    ) -> GameResult<Vec<UpgradePropagation>> {
        self.pending_selections = self.pending_selections.saturating_sub(1);
        self.options.clear();

        let kind = entry.kind;
        self.check_eligible(kind)
            .map_err(|reason| GameError::InvalidUpgradeRequest { kind, reason })?;

        let level = {
            let count = self.upgrade_levels.entry(kind).or_insert(0);
            *count += 1;
            *count
        };
        info!("Upgrade selected: {} (level {level})", entry.name);

        let propagations = match kind {
            UpgradeKind::UnlockWeapon(weapon) => {
                self.unlocked.insert(weapon);
                self.outbox.push(ProgressionEvent::WeaponUnlocked(weapon));
                vec![UpgradePropagation::SpawnWeapon(weapon)]
            }
            UpgradeKind::UpgradeWeapon(weapon) => {
                vec![UpgradePropagation::WeaponUpgraded { weapon, level }]
            }
            stat => match stats {
                Some(stats) => apply_stat_upgrade(stat, stats),
                None => {
                    diagnostics.report(GameError::MissingCollaborator {
                        collaborator: "PlayerStats",
                        context: "select_upgrade",
                    });
                    Vec::new()
                }
            },
        };
        Ok(propagations)
    }
}

fn apply_stat_upgrade(kind: UpgradeKind, stats: &mut PlayerStats) -> Vec<UpgradePropagation> {
    match kind {
        UpgradeKind::MaxHp => {
            stats.upgrade_max_hp(MAX_HP_UPGRADE_AMOUNT);
            vec![UpgradePropagation::HealthIncreased(MAX_HP_UPGRADE_AMOUNT)]
        }
        UpgradeKind::Strength => {
            stats.upgrade_strength(STRENGTH_UPGRADE_MULTIPLIER);
            vec![UpgradePropagation::MeleeDamageMultiplier(
                STRENGTH_UPGRADE_MULTIPLIER,
            )]
        }
        UpgradeKind::Intelligence => {
            stats.upgrade_intelligence(INTELLIGENCE_UPGRADE_MULTIPLIER);
            vec![UpgradePropagation::RangedDamageMultiplier(
                INTELLIGENCE_UPGRADE_MULTIPLIER,
            )]
        }
        UpgradeKind::Wisdom => {
            stats.upgrade_wisdom(WISDOM_UPGRADE_MULTIPLIER);
            vec![UpgradePropagation::RangedFireRateMultiplier(
                WISDOM_UPGRADE_MULTIPLIER,
            )]
        }
        UpgradeKind::Speed => {
            stats.upgrade_speed(SPEED_UPGRADE_MULTIPLIER);
            vec![UpgradePropagation::MoveSpeed(stats.speed())]
        }
        UpgradeKind::Luck => {
            stats.upgrade_luck(LUCK_UPGRADE_AMOUNT);
            vec![UpgradePropagation::CriticalChance(stats.luck())]
        }
        UpgradeKind::DodgeCount => {
            stats.upgrade_dodge_count(DODGE_COUNT_UPGRADE_AMOUNT);
            vec![UpgradePropagation::DodgeCharges(stats.dodge_count())]
        }
        UpgradeKind::UnlockWeapon(_) | UpgradeKind::UpgradeWeapon(_) => Vec::new(),
    }
}

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct ProgressionPlugin;

impl Plugin for ProgressionPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ProgressionEngine::default())
            .add_message::<ProgressionEvent>()
            .add_message::<SelectUpgradeRequest>()
            .add_message::<UpgradePropagation>()
            .add_message::<HealthChanged>()
            .add_systems(OnExit(GameState::MainMenu), reset_progression_system)
            .add_systems(
                Update,
                (
                    begin_level_up_system.run_if(in_state(GameState::Playing)),
                    upgrade_selection_system.run_if(in_state(GameState::LevelUp)),
                    apply_upgrade_propagation_system,
                    forward_progression_events_system,
                )
                    .chain(),
            );
    }
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Start every run from level 1 with the configured curve.
pub fn reset_progression_system(mut engine: ResMut<ProgressionEngine>, config: Res<GameConfig>) {
    *engine = ProgressionEngine::from_config(&config);
}

/// Move outbox notifications onto the message bus.
pub fn forward_progression_events_system(
    mut engine: ResMut<ProgressionEngine>,
    mut writer: MessageWriter<ProgressionEvent>,
) {
    for event in engine.drain_events() {
        writer.write(event);
    }
}

fn exhausted_pool(dropped: u32) -> GameError {
    GameError::ResourceUnavailable {
        resource: format!("upgrade options ({dropped} pending selections dropped)"),
    }
}

/// Open the level-up panel while selections are pending and something is
/// still on offer.
pub fn begin_level_up_system(
    mut engine: ResMut<ProgressionEngine>,
    mut rng: ResMut<GameRng>,
    mut diagnostics: ResMut<Diagnostics>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if engine.pending_selections() == 0 {
        return;
    }
    let dropped = engine.prepare_options(&mut rng.0);
    if dropped > 0 {
        diagnostics.report(exhausted_pool(dropped));
        return;
    }
    next_state.set(GameState::LevelUp);
}

/// Apply the first selection request of the frame and resume play once no
/// selections remain.
#[allow(clippy::too_many_arguments)]
pub fn upgrade_selection_system(
    mut requests: MessageReader<SelectUpgradeRequest>,
    mut engine: ResMut<ProgressionEngine>,
    mut q_stats: Query<&mut PlayerStats, With<Player>>,
    mut diagnostics: ResMut<Diagnostics>,
    mut rng: ResMut<GameRng>,
    mut next_state: ResMut<NextState<GameState>>,
    mut propagation: MessageWriter<UpgradePropagation>,
) {
    let Some(request) = requests.read().next() else {
        return;
    };

    let mut stats = q_stats.single_mut().ok();
    match engine.select_upgrade(&request.entry, stats.as_deref_mut(), &mut diagnostics) {
        Ok(effects) => {
            for effect in effects {
                propagation.write(effect);
            }
        }
        Err(err) => diagnostics.report(err),
    }

    let dropped = engine.prepare_options(&mut rng.0);
    if dropped > 0 {
        diagnostics.report(exhausted_pool(dropped));
    }
    if engine.pending_selections() == 0 {
        next_state.set(GameState::Playing);
    }
}

/// Push upgrade effects into the health pool, controllers and weapons.
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn apply_upgrade_propagation_system(
    mut commands: Commands,
    mut reader: MessageReader<UpgradePropagation>,
    mut q_player: Query<
        (
            Entity,
            &mut Health,
            &mut PlayerMovement,
            &mut DodgeController,
            Option<&PlayerStats>,
        ),
        With<Player>,
    >,
    mut q_weapons: Query<(&mut WeaponInstance, &WeaponSlot)>,
    config: Res<GameConfig>,
    mut diagnostics: ResMut<Diagnostics>,
    mut health_changed: MessageWriter<HealthChanged>,
) {
    for effect in reader.read() {
        let Ok((player, mut health, mut movement, mut dodge, stats)) = q_player.single_mut()
        else {
            diagnostics.report_once(
                "propagation:player",
                GameError::MissingCollaborator {
                    collaborator: "Player",
                    context: "apply_upgrade_propagation",
                },
            );
            continue;
        };

        match *effect {
            UpgradePropagation::HealthIncreased(amount) => {
                health.increase_max_health(amount);
                health_changed.write(HealthChanged {
                    ratio: health.ratio(),
                });
            }
            UpgradePropagation::MoveSpeed(speed) => movement.max_speed = speed,
            UpgradePropagation::DodgeCharges(count) => dodge.set_max_dodge_count(count),
            UpgradePropagation::RangedDamageMultiplier(m) => {
                for (mut weapon, _) in q_weapons.iter_mut() {
                    if weapon.kind().is_ranged() {
                        weapon.stats_mut().damage *= m;
                    }
                }
            }
            UpgradePropagation::RangedFireRateMultiplier(m) => {
                for (mut weapon, _) in q_weapons.iter_mut() {
                    if weapon.kind().is_ranged() {
                        let rate = weapon.stats().fire_rate() * m;
                        weapon.stats_mut().set_fire_rate(rate);
                    }
                }
            }
            UpgradePropagation::CriticalChance(chance) => {
                for (mut weapon, _) in q_weapons.iter_mut() {
                    if weapon.kind().is_ranged() {
                        weapon.stats_mut().critical_chance = chance;
                    }
                }
            }
            UpgradePropagation::MeleeDamageMultiplier(m) => {
                for (mut weapon, _) in q_weapons.iter_mut() {
                    if !weapon.kind().is_ranged() {
                        weapon.stats_mut().damage *= m;
                    }
                }
            }
            UpgradePropagation::SpawnWeapon(id) => {
                let mut weapon = WeaponInstance::for_id(id, &config);
                if let Some(stats) = stats {
                    weapon.apply_player_stats(stats);
                }
                spawn_weapon(&mut commands, player, weapon, WeaponSlot(Some(id)));
            }
            UpgradePropagation::WeaponUpgraded { weapon, level } => {
                let mut found = false;
                for (mut instance, slot) in q_weapons.iter_mut() {
                    if slot.0 == Some(weapon) {
                        instance.apply_upgrade(level);
                        found = true;
                    }
                }
                if !found {
                    diagnostics.report_once(
                        &format!("weapon:{weapon:?}"),
                        GameError::ResourceUnavailable {
                            resource: weapon.display_name().to_string(),
                        },
                    );
                }
            }
        }
    }
}
