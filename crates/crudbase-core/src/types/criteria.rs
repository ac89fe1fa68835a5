//! Criteria builder for dynamic filters.
//!
//! An [`Example`] is a disjunction of [`Criteria`] groups; each group is a
//! conjunction of [`Criterion`] predicates on named columns. Stores render
//! an example to SQL or evaluate it against a [`Record`] directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::messages;
use crate::result::AppResult;
use crate::types::flags::DeleteFlag;
use crate::types::record::Record;
use crate::types::value::Value;

/// Column holding the soft-delete flag of every entity.
pub const DEL_FLAG_COLUMN: &str = "del_flag";

/// Column holding the last update time used for exclusive updates.
pub const UPDATE_TIME_COLUMN: &str = "update_time";

/// A predicate applied to one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    IsNull,
    IsNotNull,
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Like(Value),
    NotLike(Value),
    In(Value),
    NotIn(Value),
    Between(Value, Value),
    NotBetween(Value, Value),
}

impl Condition {
    /// The operands this condition compares against.
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Self::IsNull | Self::IsNotNull => Vec::new(),
            Self::Eq(v)
            | Self::Ne(v)
            | Self::Gt(v)
            | Self::Gte(v)
            | Self::Lt(v)
            | Self::Lte(v)
            | Self::Like(v)
            | Self::NotLike(v)
            | Self::In(v)
            | Self::NotIn(v) => vec![v],
            Self::Between(low, high) | Self::NotBetween(low, high) => vec![low, high],
        }
    }

    /// Evaluate this condition against a column value with SQL semantics.
    pub fn matches(&self, actual: &Value) -> bool {
        use std::cmp::Ordering::{Greater, Less};

        match self {
            Self::IsNull => actual.is_null(),
            Self::IsNotNull => !actual.is_null(),
            Self::Eq(v) => actual.sql_eq(v),
            Self::Ne(v) => actual.compare(v).is_some_and(|o| o.is_ne()),
            Self::Gt(v) => actual.compare(v) == Some(Greater),
            Self::Gte(v) => actual.compare(v).is_some_and(|o| o.is_ge()),
            Self::Lt(v) => actual.compare(v) == Some(Less),
            Self::Lte(v) => actual.compare(v).is_some_and(|o| o.is_le()),
            Self::Like(pattern) => like(actual, pattern) == Some(true),
            Self::NotLike(pattern) => like(actual, pattern) == Some(false),
            Self::In(list) => list_contains(list, actual) == Some(true),
            Self::NotIn(list) => list_contains(list, actual) == Some(false),
            Self::Between(low, high) => between(actual, low, high) == Some(true),
            Self::NotBetween(low, high) => between(actual, low, high) == Some(false),
        }
    }
}

fn like(actual: &Value, pattern: &Value) -> Option<bool> {
    match (actual, pattern) {
        (Value::Text(s), Value::Text(p)) => Some(like_match(s, p)),
        _ => None,
    }
}

fn list_contains(list: &Value, actual: &Value) -> Option<bool> {
    if actual.is_null() {
        return None;
    }
    match list {
        Value::List(items) => Some(items.iter().any(|item| actual.sql_eq(item))),
        single => Some(actual.sql_eq(single)),
    }
}

fn between(actual: &Value, low: &Value, high: &Value) -> Option<bool> {
    let above = actual.compare(low)?.is_ge();
    let below = actual.compare(high)?.is_le();
    Some(above && below)
}

/// SQL `LIKE` matching: `%` matches any run, `_` matches one character.
fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    // matched[j]: pattern[..j] matches the text consumed so far
    let mut matched = vec![false; pattern.len() + 1];
    matched[0] = true;
    for j in 1..=pattern.len() {
        matched[j] = matched[j - 1] && pattern[j - 1] == '%';
    }
    for ch in &text {
        let mut next = vec![false; pattern.len() + 1];
        for j in 1..=pattern.len() {
            next[j] = match pattern[j - 1] {
                '%' => next[j - 1] || matched[j],
                '_' => matched[j - 1],
                p => matched[j - 1] && p == *ch,
            };
        }
        matched = next;
    }
    matched[pattern.len()]
}

/// A predicate on a named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    /// Column name as declared by the entity.
    pub column: String,
    /// The predicate.
    pub condition: Condition,
}

impl Criterion {
    pub fn new(column: impl Into<String>, condition: Condition) -> Self {
        Self {
            column: column.into(),
            condition,
        }
    }

    /// Evaluate this predicate against a row.
    pub fn matches(&self, record: &Record) -> bool {
        self.condition.matches(record.get(&self.column))
    }
}

/// A conjunction of predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    criteria: Vec<Criterion>,
}

macro_rules! single_operand {
    ($($(#[$doc:meta])* $name:ident => $variant:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
                self.push(Criterion::new(column, Condition::$variant(value.into())))
            }
        )*
    };
}

impl Criteria {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate.
    pub fn push(&mut self, criterion: Criterion) -> &mut Self {
        self.criteria.push(criterion);
        self
    }

    /// All predicates of this group.
    pub fn all(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// `column IS NULL`
    pub fn and_is_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.push(Criterion::new(column, Condition::IsNull))
    }

    /// `column IS NOT NULL`
    pub fn and_is_not_null(&mut self, column: impl Into<String>) -> &mut Self {
        self.push(Criterion::new(column, Condition::IsNotNull))
    }

    single_operand! {
        /// `column = value`
        and_equal_to => Eq;
        /// `column <> value`
        and_not_equal_to => Ne;
        /// `column > value`
        and_greater_than => Gt;
        /// `column >= value`
        and_greater_than_or_equal_to => Gte;
        /// `column < value`
        and_less_than => Lt;
        /// `column <= value`
        and_less_than_or_equal_to => Lte;
        /// `column LIKE pattern`
        and_like => Like;
        /// `column NOT LIKE pattern`
        and_not_like => NotLike;
    }

    /// `column IN (values...)`
    pub fn and_in<I, V>(&mut self, column: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let list = Value::List(values.into_iter().map(Into::into).collect());
        self.push(Criterion::new(column, Condition::In(list)))
    }

    /// `column NOT IN (values...)`
    pub fn and_not_in<I, V>(&mut self, column: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let list = Value::List(values.into_iter().map(Into::into).collect());
        self.push(Criterion::new(column, Condition::NotIn(list)))
    }

    /// `column BETWEEN low AND high`
    pub fn and_between(
        &mut self,
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.push(Criterion::new(
            column,
            Condition::Between(low.into(), high.into()),
        ))
    }

    /// `column NOT BETWEEN low AND high`
    pub fn and_not_between(
        &mut self,
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> &mut Self {
        self.push(Criterion::new(
            column,
            Condition::NotBetween(low.into(), high.into()),
        ))
    }

    /// Whether every predicate holds for the row.
    pub fn matches(&self, record: &Record) -> bool {
        self.criteria.iter().all(|c| c.matches(record))
    }

    fn and_equal_to_once(&mut self, column: &str, value: Value) {
        let exists = self
            .criteria
            .iter()
            .any(|c| c.column == column && c.condition == Condition::Eq(value.clone()));
        if !exists {
            self.push(Criterion::new(column, Condition::Eq(value)));
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Return the SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

/// A disjunction of [`Criteria`] groups plus ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Example {
    ored: Vec<Criteria>,
    order_by: Vec<OrderBy>,
    outer_live: bool,
}

impl Example {
    /// Create an example with no group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new empty group and return it for building.
    pub fn create_criteria(&mut self) -> &mut Criteria {
        self.ored.push(Criteria::new());
        let last = self.ored.len() - 1;
        &mut self.ored[last]
    }

    /// Append an already built group.
    pub fn or(&mut self, criteria: Criteria) -> &mut Self {
        self.ored.push(criteria);
        self
    }

    /// The OR-ed groups.
    pub fn ored_criteria(&self) -> &[Criteria] {
        &self.ored
    }

    /// Add an `ORDER BY` term.
    pub fn order_by(&mut self, column: impl Into<String>, direction: SortDirection) -> &mut Self {
        self.order_by.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn orders(&self) -> &[OrderBy] {
        &self.order_by
    }

    /// Whether the live predicate is applied outside the OR-ed groups.
    pub fn is_outer_live(&self) -> bool {
        self.outer_live
    }

    /// Every column referenced by a predicate or an ordering term.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.ored
            .iter()
            .flat_map(|g| g.all().iter().map(|c| c.column.as_str()))
            .chain(self.order_by.iter().map(|o| o.column.as_str()))
    }

    /// Create an empty group when the caller supplied none.
    pub fn ensure_criteria(&mut self) -> &mut Self {
        if self.ored.is_empty() {
            self.create_criteria();
        }
        self
    }

    /// AND `del_flag = '0'` into every group.
    pub fn and_live(&mut self) -> &mut Self {
        let live = Value::from(DeleteFlag::Exist);
        for group in &mut self.ored {
            group.and_equal_to_once(DEL_FLAG_COLUMN, live.clone());
        }
        self
    }

    /// AND `del_flag = '0'` once, around the whole disjunction.
    pub fn and_live_outside(&mut self) -> &mut Self {
        self.outer_live = true;
        self
    }

    /// AND `update_time = last` (millisecond precision) into every group,
    /// creating a group when there is none.
    pub fn and_update_time_equal_to(&mut self, last: DateTime<Utc>) -> &mut Self {
        self.ensure_criteria();
        let stamp = Value::timestamp_millis(last);
        for group in &mut self.ored {
            group.and_equal_to(UPDATE_TIME_COLUMN, stamp.clone());
        }
        self
    }

    /// Reject examples unfit for a mutating statement.
    ///
    /// An example without groups, a group without predicates, or a predicate
    /// whose operand is null, blank, or an empty collection would widen the
    /// statement to rows the caller never meant to touch.
    pub fn validate_for_mutation(&self) -> AppResult<()> {
        if self.ored.is_empty() {
            return Err(AppError::validation(messages::CRITERIA_NOT_EXIST));
        }
        for group in &self.ored {
            if group.is_empty() {
                return Err(AppError::validation(messages::CRITERION_NOT_EXIST));
            }
            let missing = group
                .all()
                .iter()
                .flat_map(|c| c.condition.operands())
                .any(Value::is_missing);
            if missing {
                return Err(AppError::validation(messages::CRITERION_VALUE_NOT_EXIST));
            }
        }
        Ok(())
    }

    /// Evaluate the example against a row.
    ///
    /// Empty groups are ignored; when every group is empty the example
    /// matches all rows.
    pub fn matches(&self, record: &Record) -> bool {
        let mut groups = self.ored.iter().filter(|g| !g.is_empty()).peekable();
        let grouped = groups.peek().is_none() || groups.any(|g| g.matches(record));
        grouped && (!self.outer_live || is_live(record))
    }
}

fn is_live(record: &Record) -> bool {
    record.get(DEL_FLAG_COLUMN).sql_eq(&Value::from(DeleteFlag::Exist))
}
