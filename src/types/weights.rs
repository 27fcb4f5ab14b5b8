use serde::{Deserialize, Serialize};

/// Group a weight belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeightCategory {
    Technical,
    PriceAction,
    Market,
    Pullback,
}

impl WeightCategory {
    /// Get display name for this category.
    pub fn name(&self) -> &'static str {
        match self {
            WeightCategory::Technical => "technical",
            WeightCategory::PriceAction => "priceAction",
            WeightCategory::Market => "market",
            WeightCategory::Pullback => "pullback",
        }
    }
}

/// Every weight the scoring engine reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightKey {
    Rsi,
    Macd,
    Bollinger,
    Patterns,
    Momentum,
    Volume,
    Trend,
    Pullbacks,
}

impl WeightKey {
    pub const ALL: [WeightKey; 8] = [
        WeightKey::Rsi,
        WeightKey::Macd,
        WeightKey::Bollinger,
        WeightKey::Patterns,
        WeightKey::Momentum,
        WeightKey::Volume,
        WeightKey::Trend,
        WeightKey::Pullbacks,
    ];

    pub fn category(&self) -> WeightCategory {
        match self {
            WeightKey::Rsi | WeightKey::Macd | WeightKey::Bollinger => WeightCategory::Technical,
            WeightKey::Patterns => WeightCategory::PriceAction,
            WeightKey::Momentum | WeightKey::Volume => WeightCategory::Market,
            WeightKey::Trend | WeightKey::Pullbacks => WeightCategory::Pullback,
        }
    }

    /// Dotted name, e.g. `technical.rsi`.
    pub fn path(&self) -> String {
        let name = match self {
            WeightKey::Rsi => "rsi",
            WeightKey::Macd => "macd",
            WeightKey::Bollinger => "bollinger",
            WeightKey::Patterns => "patterns",
            WeightKey::Momentum => "momentum",
            WeightKey::Volume => "volume",
            WeightKey::Trend => "trend",
            WeightKey::Pullbacks => "pullbacks",
        };
        format!("{}.{}", self.category().name(), name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalWeights {
    pub rsi: f64,
    pub macd: f64,
    pub bollinger: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceActionWeights {
    pub patterns: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketWeights {
    pub momentum: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PullbackWeights {
    pub trend: f64,
    pub pullbacks: f64,
}

/// Multipliers the scoring engine applies to each rule.
///
/// Written only by training; every other path reads a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightTable {
    pub technical: TechnicalWeights,
    pub price_action: PriceActionWeights,
    pub market: MarketWeights,
    pub pullback: PullbackWeights,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            technical: TechnicalWeights {
                rsi: 0.15,
                macd: 0.15,
                bollinger: 0.1,
            },
            price_action: PriceActionWeights { patterns: 0.1 },
            market: MarketWeights {
                momentum: 0.1,
                volume: 0.1,
            },
            pullback: PullbackWeights {
                trend: 0.2,
                pullbacks: 0.1,
            },
        }
    }
}

impl WeightTable {
    /// A table with every weight set to `value`.
    pub fn uniform(value: f64) -> Self {
        let mut table = Self::default();
        for key in WeightKey::ALL {
            *table.get_mut(key) = value;
        }
        table
    }

    pub fn get(&self, key: WeightKey) -> f64 {
        match key {
            WeightKey::Rsi => self.technical.rsi,
            WeightKey::Macd => self.technical.macd,
            WeightKey::Bollinger => self.technical.bollinger,
            WeightKey::Patterns => self.price_action.patterns,
            WeightKey::Momentum => self.market.momentum,
            WeightKey::Volume => self.market.volume,
            WeightKey::Trend => self.pullback.trend,
            WeightKey::Pullbacks => self.pullback.pullbacks,
        }
    }

    fn get_mut(&mut self, key: WeightKey) -> &mut f64 {
        match key {
            WeightKey::Rsi => &mut self.technical.rsi,
            WeightKey::Macd => &mut self.technical.macd,
            WeightKey::Bollinger => &mut self.technical.bollinger,
            WeightKey::Patterns => &mut self.price_action.patterns,
            WeightKey::Momentum => &mut self.market.momentum,
            WeightKey::Volume => &mut self.market.volume,
            WeightKey::Trend => &mut self.pullback.trend,
            WeightKey::Pullbacks => &mut self.pullback.pullbacks,
        }
    }

    /// Multiply every weight by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let mut table = *self;
        for key in WeightKey::ALL {
            *table.get_mut(key) *= factor;
        }
        table
    }

    /// Clamp every weight into `[min, max]`.
    pub fn clamped(&self, min: f64, max: f64) -> Self {
        let mut table = *self;
        for key in WeightKey::ALL {
            let weight = table.get_mut(key);
            *weight = weight.clamp(min, max);
        }
        table
    }

    /// Iterate `(key, weight)` pairs in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (WeightKey, f64)> + '_ {
        WeightKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }
}
