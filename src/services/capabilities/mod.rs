// Source capabilities
//
// A per-backend declaration of which SQL constructs and functions can be
// pushed down. Descriptors are pure, read-only queries; one instance is
// shared across every concurrent execution against its backend.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// SQL features whose pushdown support varies across backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlFeature {
    SelectDistinct,
    SelectLiterals,
    AliasedGroups,
    InnerJoins,
    OuterJoins,
    FullOuterJoins,
    SelfJoins,
    BetweenCriteria,
    CompareCriteriaEquals,
    CompareCriteriaOrdered,
    LikeCriteria,
    LikeCriteriaEscapeCharacter,
    InCriteria,
    InCriteriaSubquery,
    IsNullCriteria,
    AndCriteria,
    OrCriteria,
    NotCriteria,
    ExistsCriteria,
    QuantifiedCompareSome,
    QuantifiedCompareAll,
    OrderBy,
    OrderByUnrelated,
    GroupBy,
    Having,
    AggregatesSum,
    AggregatesAvg,
    AggregatesMin,
    AggregatesMax,
    AggregatesCount,
    AggregatesCountStar,
    AggregatesDistinct,
    ScalarSubqueries,
    CorrelatedSubqueries,
    CaseExpressions,
    SearchedCaseExpressions,
    Unions,
    Intersect,
    Except,
    InlineViews,
    /// Native LIMIT-style row limiting; absent support triggers the TOP-n
    /// wrapping rewrite
    RowLimit,
    RowOffset,
    FunctionsInGroupBy,
    InsertWithQueryExpression,
    BatchedUpdates,
}

/// Read-only capability descriptor for one backend class
pub trait Capabilities: Send + Sync {
    /// Whether the backend can push down the given SQL feature
    fn supports_feature(&self, feature: SqlFeature) -> bool;

    /// Canonical names (case-sensitive) of pushdown-able scalar functions.
    /// An absent name means the function must be evaluated locally or the
    /// command rejected.
    fn supported_functions(&self) -> &HashSet<String>;

    /// Largest number of values allowed in one IN predicate; zero or
    /// negative means unlimited
    fn max_in_criteria_size(&self) -> i32 {
        0
    }

    /// Largest number of groups allowed in one FROM clause; zero or
    /// negative means unlimited
    fn max_from_groups(&self) -> i32 {
        0
    }
}

/// Conservative defaults: plain comparisons and boolean connectives only,
/// no scalar functions
#[derive(Debug, Default)]
pub struct BasicCapabilities {
    functions: HashSet<String>,
}

impl BasicCapabilities {
    pub fn new() -> Self {
        Self {
            functions: HashSet::new(),
        }
    }
}

impl Capabilities for BasicCapabilities {
    fn supports_feature(&self, feature: SqlFeature) -> bool {
        matches!(
            feature,
            SqlFeature::CompareCriteriaEquals
                | SqlFeature::CompareCriteriaOrdered
                | SqlFeature::AndCriteria
                | SqlFeature::OrCriteria
                | SqlFeature::IsNullCriteria
        )
    }

    fn supported_functions(&self) -> &HashSet<String> {
        &self.functions
    }
}

/// Loopback test backend: accepts everything the command model can express
#[derive(Debug)]
pub struct LoopbackCapabilities {
    functions: HashSet<String>,
}

impl LoopbackCapabilities {
    pub fn new() -> Self {
        let functions = ["mod", "concat", "substring", "ucase", "lcase", "convert"]
            .into_iter()
            .map(str::to_string)
            .collect();
        Self { functions }
    }
}

impl Default for LoopbackCapabilities {
    fn default() -> Self {
        Self::new()
    }
}

impl Capabilities for LoopbackCapabilities {
    fn supports_feature(&self, _feature: SqlFeature) -> bool {
        true
    }

    fn supported_functions(&self) -> &HashSet<String> {
        &self.functions
    }
}

/// SQL-Server-family backends (SQL Server, Sybase)
#[derive(Debug)]
pub struct SqlServerCapabilities {
    functions: HashSet<String>,
}

impl SqlServerCapabilities {
    pub fn new() -> Self {
        let functions = [
            "mod", "concat", "substring", "ucase", "lcase", "convert", "abs", "length",
            "locate", "ltrim", "rtrim", "repeat", "curdate", "curtime", "dayofmonth",
            "dayofweek", "dayofyear", "hour", "minute", "month", "second", "week", "year",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();
        Self { functions }
    }
}

impl Default for SqlServerCapabilities {
    fn default() -> Self {
        Self::new()
    }
}

impl Capabilities for SqlServerCapabilities {
    fn supports_feature(&self, feature: SqlFeature) -> bool {
        match feature {
            // no native LIMIT/OFFSET; row limits are rewritten to TOP
            SqlFeature::RowLimit => false,
            SqlFeature::RowOffset => false,
            SqlFeature::OrderByUnrelated => false,
            SqlFeature::FullOuterJoins => false,
            SqlFeature::Except => false,
            SqlFeature::Intersect => false,
            _ => true,
        }
    }

    fn supported_functions(&self) -> &HashSet<String> {
        &self.functions
    }

    fn max_in_criteria_size(&self) -> i32 {
        1000
    }

    fn max_from_groups(&self) -> i32 {
        0
    }
}

/// Delimited-file backend: single-group scans with predicate filtering
#[derive(Debug, Default)]
pub struct DelimitedFileCapabilities {
    functions: HashSet<String>,
}

impl DelimitedFileCapabilities {
    pub fn new() -> Self {
        Self {
            functions: HashSet::new(),
        }
    }
}

impl Capabilities for DelimitedFileCapabilities {
    fn supports_feature(&self, feature: SqlFeature) -> bool {
        matches!(
            feature,
            SqlFeature::CompareCriteriaEquals
                | SqlFeature::CompareCriteriaOrdered
                | SqlFeature::AndCriteria
                | SqlFeature::OrCriteria
                | SqlFeature::IsNullCriteria
                | SqlFeature::InCriteria
                | SqlFeature::LikeCriteria
                | SqlFeature::LikeCriteriaEscapeCharacter
                | SqlFeature::RowLimit
        )
    }

    fn supported_functions(&self) -> &HashSet<String> {
        &self.functions
    }

    fn max_from_groups(&self) -> i32 {
        1
    }
}

/// Factory producing a capabilities descriptor
pub type CapabilitiesFactory = fn() -> Arc<dyn Capabilities>;

/// Explicit name-to-factory registry
///
/// Replaces runtime class loading: every resolvable capabilities
/// implementation is registered at construction time, and the registry is
/// passed to the connectors that consult it rather than living in process
/// globals.
pub struct CapabilitiesRegistry {
    factories: HashMap<String, CapabilitiesFactory>,
}

impl CapabilitiesRegistry {
    /// Registry with the built-in descriptors registered
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("basic", || Arc::new(BasicCapabilities::new()));
        registry.register("loopback", || Arc::new(LoopbackCapabilities::new()));
        registry.register("sqlserver", || Arc::new(SqlServerCapabilities::new()));
        registry.register("delimited", || Arc::new(DelimitedFileCapabilities::new()));
        registry
    }

    /// Register a factory under an identifier, overriding any previous one
    pub fn register(&mut self, name: impl Into<String>, factory: CapabilitiesFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Instantiate the descriptor registered under `name`
    pub fn create(&self, name: &str) -> Option<Arc<dyn Capabilities>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Resolve an optional override, falling back to a default factory
    ///
    /// An unknown override is logged and ignored rather than failing the
    /// connector.
    pub fn resolve_or_default(
        &self,
        override_name: Option<&str>,
        default: CapabilitiesFactory,
    ) -> Arc<dyn Capabilities> {
        if let Some(name) = override_name {
            match self.create(name) {
                Some(caps) => return caps,
                None => {
                    tracing::warn!(
                        "Unknown capabilities class '{}', falling back to default",
                        name
                    );
                }
            }
        }
        default()
    }
}

impl Default for CapabilitiesRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
