use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Food,
    Wood,
    Stone,
    Gold,
    Population,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Food,
        Resource::Wood,
        Resource::Stone,
        Resource::Gold,
        Resource::Population,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Resource::Food => "food",
            Resource::Wood => "wood",
            Resource::Stone => "stone",
            Resource::Gold => "gold",
            Resource::Population => "population",
        }
    }
}

/// A bundle of resource amounts. Used for costs, production outputs, and
/// ledger totals alike; absent kinds are zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSet {
    pub food: u64,
    pub wood: u64,
    pub stone: u64,
    pub gold: u64,
    pub population: u64,
}

impl ResourceSet {
    pub const NONE: ResourceSet = ResourceSet {
        food: 0,
        wood: 0,
        stone: 0,
        gold: 0,
        population: 0,
    };

    pub fn amount(&self, kind: Resource) -> u64 {
        match kind {
            Resource::Food => self.food,
            Resource::Wood => self.wood,
            Resource::Stone => self.stone,
            Resource::Gold => self.gold,
            Resource::Population => self.population,
        }
    }

    pub fn set(&mut self, kind: Resource, amount: u64) {
        match kind {
            Resource::Food => self.food = amount,
            Resource::Wood => self.wood = amount,
            Resource::Stone => self.stone = amount,
            Resource::Gold => self.gold = amount,
            Resource::Population => self.population = amount,
        }
    }

    pub fn is_empty(&self) -> bool {
        Resource::ALL.iter().all(|&kind| self.amount(kind) == 0)
    }

    pub fn total(&self) -> u64 {
        Resource::ALL.iter().map(|&kind| self.amount(kind)).sum()
    }

    /// Non-zero entries, in declaration order.
    pub fn entries(&self) -> Vec<(Resource, u64)> {
        Resource::ALL
            .iter()
            .filter_map(|&kind| {
                let amount = self.amount(kind);
                (amount > 0).then_some((kind, amount))
            })
            .collect()
    }

    /// Each amount multiplied by `factor` and floored back to whole units.
    pub fn scaled_floor(&self, factor: f64) -> ResourceSet {
        let mut scaled = ResourceSet::NONE;
        for (kind, amount) in self.entries() {
            scaled.set(kind, (amount as f64 * factor).floor() as u64);
        }
        scaled
    }
}

/// The five fungible counters the whole economy settles against. Amounts are
/// unsigned; every deduction is preceded by an afford check so no operation
/// can drive a counter below zero.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    amounts: ResourceSet,
}

impl Ledger {
    pub fn new(starting: ResourceSet) -> Self {
        Self { amounts: starting }
    }

    pub fn amount(&self, kind: Resource) -> u64 {
        self.amounts.amount(kind)
    }

    pub fn totals(&self) -> ResourceSet {
        self.amounts
    }

    pub fn can_afford(&self, cost: &ResourceSet) -> bool {
        Resource::ALL
            .iter()
            .all(|&kind| cost.amount(kind) <= self.amounts.amount(kind))
    }

    /// All-or-nothing: either the full multi-resource cost is deducted or
    /// nothing is.
    pub fn deduct(&mut self, cost: &ResourceSet) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for (kind, amount) in cost.entries() {
            self.amounts.set(kind, self.amounts.amount(kind) - amount);
        }
        true
    }

    pub fn add(&mut self, gained: &ResourceSet) {
        for (kind, amount) in gained.entries() {
            self.amounts
                .set(kind, self.amounts.amount(kind).saturating_add(amount));
        }
    }

    /// Removes up to `amount` of one kind, clamping at zero. Returns what was
    /// actually taken.
    pub fn saturating_take(&mut self, kind: Resource, amount: u64) -> u64 {
        let held = self.amounts.amount(kind);
        let taken = amount.min(held);
        self.amounts.set(kind, held - taken);
        taken
    }
}
