//! Timed random events: the Wandering Trader, Bountiful Harvest, and the
//! Royal Tax Collector. Offers roll all their amounts at trigger time from
//! the engine's seeded RNG, so accepting or dismissing them replays
//! deterministically.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::debug;

use crate::config::GameConfig;
use crate::engine::CommandError;
use crate::resources::{Resource, ResourceSet};
use crate::state::GameState;

/// Fixed exchange rates the trader draws from: give per unit, receive per
/// unit. Fractional receive sides floor after scaling by the offer size.
const TRADE_RATIOS: [(Resource, f64, Resource, f64); 6] = [
    (Resource::Food, 2.0, Resource::Wood, 1.0),
    (Resource::Food, 3.0, Resource::Gold, 1.0),
    (Resource::Wood, 1.0, Resource::Food, 1.5),
    (Resource::Wood, 2.0, Resource::Gold, 1.0),
    (Resource::Gold, 1.0, Resource::Food, 4.0),
    (Resource::Gold, 1.0, Resource::Wood, 2.0),
];

const TAX_RATE: f64 = 0.2;

/// Selection weights: trader 1.0, harvest 0.3, tax 0.2.
const EVENT_WEIGHTS: [(EventKind, f64); 3] = [
    (EventKind::WanderingTrader, 1.0),
    (EventKind::BountifulHarvest, 0.3),
    (EventKind::RoyalTax, 0.2),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    WanderingTrader,
    BountifulHarvest,
    RoyalTax,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TradeOffer {
    pub give: Resource,
    pub give_amount: u64,
    pub receive: Resource,
    pub receive_amount: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ActiveEvent {
    WanderingTrader {
        offer: TradeOffer,
        expires_at: u64,
    },
    BountifulHarvest {
        bonus_food: u64,
        bonus_wood: u64,
        expires_at: u64,
    },
    RoyalTax {
        amount: u64,
        expires_at: u64,
    },
}

impl ActiveEvent {
    fn expires_at(&self) -> u64 {
        match self {
            ActiveEvent::WanderingTrader { expires_at, .. }
            | ActiveEvent::BountifulHarvest { expires_at, .. }
            | ActiveEvent::RoyalTax { expires_at, .. } => *expires_at,
        }
    }
}

#[derive(Debug)]
pub(crate) struct EventScheduler {
    next_trigger: u64,
    active: Option<ActiveEvent>,
}

impl EventScheduler {
    pub(crate) fn new(config: &GameConfig, rng: &mut ChaCha8Rng, now: u64) -> Self {
        let mut scheduler = Self {
            next_trigger: 0,
            active: None,
        };
        scheduler.schedule_next(config, rng, now);
        scheduler
    }

    pub(crate) fn active(&self) -> Option<&ActiveEvent> {
        self.active.as_ref()
    }

    fn schedule_next(&mut self, config: &GameConfig, rng: &mut ChaCha8Rng, now: u64) {
        let min = config.event_min_interval_ms;
        let max = config.event_max_interval_ms.max(min);
        self.next_trigger = now + rng.gen_range(min..=max);
    }

    /// Expires a stale offer and triggers a new one when its moment has
    /// come. Offers whose rolled amount would be zero (taxing an empty
    /// treasury) are skipped entirely.
    pub(crate) fn tick(
        &mut self,
        state: &GameState,
        config: &GameConfig,
        rng: &mut ChaCha8Rng,
        now: u64,
    ) {
        if let Some(active) = &self.active {
            if now >= active.expires_at() {
                debug!("event expired unanswered");
                self.active = None;
                self.schedule_next(config, rng, now);
            }
        }
        if self.active.is_none() && now >= self.next_trigger {
            self.active = self.roll_event(state, config, rng, now);
            if self.active.is_none() {
                self.schedule_next(config, rng, now);
            }
        }
    }

    fn roll_event(
        &mut self,
        state: &GameState,
        config: &GameConfig,
        rng: &mut ChaCha8Rng,
        now: u64,
    ) -> Option<ActiveEvent> {
        let total: f64 = EVENT_WEIGHTS.iter().map(|(_, weight)| weight).sum();
        let mut roll = rng.gen::<f64>() * total;
        let mut kind = EVENT_WEIGHTS[0].0;
        for (candidate, weight) in EVENT_WEIGHTS {
            roll -= weight;
            if roll <= 0.0 {
                kind = candidate;
                break;
            }
        }

        let expires_at = now + config.event_duration_ms;
        match kind {
            EventKind::WanderingTrader => {
                let (give, give_per_unit, receive, receive_per_unit) =
                    TRADE_RATIOS[rng.gen_range(0..TRADE_RATIOS.len())];
                let units = rng.gen_range(2..=10);
                Some(ActiveEvent::WanderingTrader {
                    offer: TradeOffer {
                        give,
                        give_amount: (give_per_unit * units as f64).floor() as u64,
                        receive,
                        receive_amount: (receive_per_unit * units as f64).floor() as u64,
                    },
                    expires_at,
                })
            }
            EventKind::BountifulHarvest => Some(ActiveEvent::BountifulHarvest {
                bonus_food: rng.gen_range(10..=30),
                bonus_wood: rng.gen_range(5..=15),
                expires_at,
            }),
            EventKind::RoyalTax => {
                let amount =
                    (state.ledger.amount(Resource::Gold) as f64 * TAX_RATE).floor() as u64;
                // A penniless kingdom interests no tax collector.
                (amount > 0).then_some(ActiveEvent::RoyalTax { amount, expires_at })
            }
        }
    }

    /// Applies the active event atomically. A trade the player cannot cover
    /// is rejected and the offer stays open.
    pub(crate) fn accept(
        &mut self,
        state: &mut GameState,
        config: &GameConfig,
        rng: &mut ChaCha8Rng,
        now: u64,
    ) -> Result<(), CommandError> {
        let active = self.active.clone().ok_or(CommandError::NoActiveEvent)?;
        match active {
            ActiveEvent::WanderingTrader { offer, .. } => {
                let mut give = ResourceSet::NONE;
                give.set(offer.give, offer.give_amount);
                if !state.ledger.deduct(&give) {
                    return Err(CommandError::CannotAfford);
                }
                let mut receive = ResourceSet::NONE;
                receive.set(offer.receive, offer.receive_amount);
                state.ledger.add(&receive);
            }
            ActiveEvent::BountifulHarvest {
                bonus_food,
                bonus_wood,
                ..
            } => {
                state.ledger.add(&ResourceSet {
                    food: bonus_food,
                    wood: bonus_wood,
                    ..ResourceSet::NONE
                });
            }
            ActiveEvent::RoyalTax { amount, .. } => {
                // The treasury may have shrunk since the assessment.
                state.ledger.saturating_take(Resource::Gold, amount);
            }
        }
        self.active = None;
        self.schedule_next(config, rng, now);
        Ok(())
    }

    pub(crate) fn dismiss(
        &mut self,
        config: &GameConfig,
        rng: &mut ChaCha8Rng,
        now: u64,
    ) -> Result<(), CommandError> {
        if self.active.take().is_none() {
            return Err(CommandError::NoActiveEvent);
        }
        self.schedule_next(config, rng, now);
        Ok(())
    }
}
