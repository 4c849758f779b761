//! Near-term expense forecasting
//!
//! An instance-based (k-nearest-neighbor) regressor over calendar features
//! plus a dense category code, trained fresh per forecasting session from the
//! full transaction history. The category-code mapping is an immutable value
//! object built once per session and reused for training and every
//! prediction; re-deriving it mid-session would silently shift codes.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::Transaction;

/// Minimum history size for training a forecaster
pub const MIN_TRAINING_SAMPLES: usize = 10;

/// Neighbors averaged per prediction
const NEIGHBORS: usize = 5;

/// Immutable category -> dense code mapping for one forecast session.
///
/// Codes are assigned in first-seen order over the distinct categories of
/// the history the session was built from.
#[derive(Debug, Clone)]
pub struct CategoryCodes {
    categories: Vec<String>,
    index: HashMap<String, usize>,
}

impl CategoryCodes {
    /// Build from categories in first-seen order
    pub fn new(categories: Vec<String>) -> Self {
        let index = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { categories, index }
    }

    /// Build from the ledger's first-seen category order
    pub fn from_ledger(db: &Database) -> Result<Self> {
        Ok(Self::new(db.categories_by_first_seen()?))
    }

    pub fn code_of(&self, category: &str) -> Option<usize> {
        self.index.get(category).copied()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// One training sample: calendar features, category code, observed amount
#[derive(Debug, Clone, Copy)]
pub struct TrainingSample {
    /// Monday = 1 ... Sunday = 7
    pub day_of_week: u32,
    pub day_of_month: u32,
    pub month: u32,
    pub category_code: usize,
    pub amount: f64,
}

impl TrainingSample {
    /// Derive a sample from a ledger transaction using a session's codes
    pub fn from_transaction(tx: &Transaction, codes: &CategoryCodes) -> Option<Self> {
        Some(Self {
            day_of_week: tx.date.weekday().number_from_monday(),
            day_of_month: tx.date.day(),
            month: tx.date.month(),
            category_code: codes.code_of(&tx.category)?,
            amount: tx.amount,
        })
    }

    fn features(&self) -> [f64; 4] {
        [
            self.day_of_week as f64,
            self.day_of_month as f64,
            self.month as f64,
            self.category_code as f64,
        ]
    }
}

/// k-nearest-neighbor regressor over (day-of-week, day-of-month, month,
/// category code). Features are min-max scaled by the training ranges so no
/// dimension dominates the distance.
#[derive(Debug, Clone)]
pub struct SpendForecaster {
    features: Vec<[f64; 4]>,
    targets: Vec<f64>,
    mins: [f64; 4],
    maxs: [f64; 4],
}

impl SpendForecaster {
    /// Train from samples. Fails with `InsufficientData` below
    /// `MIN_TRAINING_SAMPLES`.
    pub fn train(samples: &[TrainingSample]) -> Result<Self> {
        if samples.len() < MIN_TRAINING_SAMPLES {
            return Err(Error::InsufficientData(format!(
                "forecaster needs at least {} samples, got {}",
                MIN_TRAINING_SAMPLES,
                samples.len()
            )));
        }

        let mut mins = [f64::INFINITY; 4];
        let mut maxs = [f64::NEG_INFINITY; 4];
        let mut features = Vec::with_capacity(samples.len());
        let mut targets = Vec::with_capacity(samples.len());

        for sample in samples {
            let f = sample.features();
            for d in 0..4 {
                mins[d] = mins[d].min(f[d]);
                maxs[d] = maxs[d].max(f[d]);
            }
            features.push(f);
            targets.push(sample.amount);
        }

        debug!(samples = samples.len(), "Trained spend forecaster");
        Ok(Self {
            features,
            targets,
            mins,
            maxs,
        })
    }

    fn scale(&self, raw: [f64; 4]) -> [f64; 4] {
        let mut scaled = [0.0; 4];
        for d in 0..4 {
            let range = self.maxs[d] - self.mins[d];
            scaled[d] = if range > 0.0 {
                (raw[d] - self.mins[d]) / range
            } else {
                0.0
            };
        }
        scaled
    }

    /// Predicted spend for one (calendar day, category code) pair.
    ///
    /// Averages the k nearest training samples; ties on distance are broken
    /// by training order, so identical inputs against an unchanged model are
    /// deterministic. Never negative.
    pub fn predict(
        &self,
        day_of_week: u32,
        day_of_month: u32,
        month: u32,
        category_code: usize,
    ) -> f64 {
        let query = self.scale([
            day_of_week as f64,
            day_of_month as f64,
            month as f64,
            category_code as f64,
        ]);

        let mut distances: Vec<(f64, usize)> = self
            .features
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let scaled = self.scale(*f);
                let d2: f64 = scaled
                    .iter()
                    .zip(query.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                (d2, i)
            })
            .collect();
        distances.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        let k = NEIGHBORS.min(distances.len());
        let mean = distances[..k]
            .iter()
            .map(|(_, i)| self.targets[*i])
            .sum::<f64>()
            / k as f64;
        mean.max(0.0)
    }
}

/// Per-category forecast amount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryForecast {
    pub category: String,
    pub amount: f64,
}

/// Forecast for one calendar month, positive categories only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyForecast {
    pub year: i32,
    pub month: u32,
    /// Largest forecast first
    pub categories: Vec<CategoryForecast>,
    pub total: f64,
}

/// A budget on track to be exceeded by the forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedBreach {
    pub category: String,
    pub monthly_limit: f64,
    pub projected: f64,
    pub overspend: f64,
}

/// Forecast with prior-month comparison and projected budget breaches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    pub forecast: MonthlyForecast,
    pub last_month_actual: f64,
    /// forecast total minus last month's actual
    pub difference: f64,
    pub breaches: Vec<ProjectedBreach>,
    pub total_projected_overspend: f64,
}

/// One train-then-predict-many workflow sharing a single category-code
/// mapping
pub struct ForecastSession {
    model: SpendForecaster,
    codes: CategoryCodes,
}

impl ForecastSession {
    /// Train a session from the full ledger history
    pub fn build(db: &Database) -> Result<Self> {
        let codes = CategoryCodes::from_ledger(db)?;
        let samples: Vec<TrainingSample> = db
            .list_transactions()?
            .iter()
            .filter_map(|tx| TrainingSample::from_transaction(tx, &codes))
            .collect();
        let model = SpendForecaster::train(&samples)?;
        info!(
            samples = samples.len(),
            categories = codes.len(),
            "Forecast session ready"
        );
        Ok(Self { model, codes })
    }

    pub fn codes(&self) -> &CategoryCodes {
        &self.codes
    }

    /// Predicted spend for a single date and category.
    /// Unknown categories predict zero.
    pub fn predict_for_date(&self, date: NaiveDate, category: &str) -> f64 {
        match self.codes.code_of(category) {
            Some(code) => self.model.predict(
                date.weekday().number_from_monday(),
                date.day(),
                date.month(),
                code,
            ),
            None => 0.0,
        }
    }

    /// Forecast a whole month: per category, sum the predictions for every
    /// calendar day; only categories with a positive total are reported.
    pub fn forecast_month(&self, year: i32, month: u32) -> MonthlyForecast {
        let days = days_in_month(year, month);
        let mut categories = Vec::new();
        let mut total = 0.0;

        for category in self.codes.categories() {
            let mut category_total = 0.0;
            for day in 1..=days {
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    category_total += self.predict_for_date(date, category);
                }
            }
            if category_total > 0.0 {
                total += category_total;
                categories.push(CategoryForecast {
                    category: category.clone(),
                    amount: category_total,
                });
            }
        }

        categories.sort_by(|a, b| {
            b.amount
                .partial_cmp(&a.amount)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        MonthlyForecast {
            year,
            month,
            categories,
            total,
        }
    }

    /// Forecast a month and compare against the actual total of the
    /// calendar month before `today`, plus the configured budget limits
    pub fn report(
        &self,
        db: &Database,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<ForecastReport> {
        let forecast = self.forecast_month(year, month);

        let last_month_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
            .and_then(|d| d.checked_sub_months(chrono::Months::new(1)))
            .unwrap_or(today);
        let last_month_actual =
            db.total_for_month(last_month_start.year(), last_month_start.month())?;

        let by_category: HashMap<&str, f64> = forecast
            .categories
            .iter()
            .map(|c| (c.category.as_str(), c.amount))
            .collect();

        let mut breaches = Vec::new();
        let mut total_projected_overspend = 0.0;
        for budget in db.list_budgets()? {
            let projected = by_category
                .get(budget.category.as_str())
                .copied()
                .unwrap_or(0.0);
            if projected > budget.monthly_limit {
                let overspend = projected - budget.monthly_limit;
                total_projected_overspend += overspend;
                breaches.push(ProjectedBreach {
                    category: budget.category,
                    monthly_limit: budget.monthly_limit,
                    projected,
                    overspend,
                });
            }
        }

        Ok(ForecastReport {
            difference: forecast.total - last_month_actual,
            forecast,
            last_month_actual,
            breaches,
            total_projected_overspend,
        })
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (next, NaiveDate::from_ymd_opt(year, month, 1)) {
        (Some(next), Some(start)) => next.signed_duration_since(start).num_days() as u32,
        _ => 30,
    }
}
