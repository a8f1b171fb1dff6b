//! Schema contracts for tabular resources
//!
//! A [`SchemaContract`] declares the expected columns of a CSV resource:
//! type, nullability, and value constraints, plus table-level strictness
//! (what happens to undeclared columns) and ordering. Validation is lazy:
//! every violation across all checked rows is collected into one
//! [`SchemaErrors`] value instead of stopping at the first offense.
//!
//! Contracts are immutable. [`SchemaContract::narrowed_to`] derives a new
//! contract for a resource that carries only a subset of the declared
//! column universe, so partial-column files from older catalog years can
//! still be smoke-checked.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::fmt;

use crate::table::Table;

pub mod loans;

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Str,
    Int,
    Float,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Str => write!(f, "str"),
            DType::Int => write!(f, "int"),
            DType::Float => write!(f, "float"),
        }
    }
}

/// Value constraint attached to a column
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    GreaterThan(f64),
    GreaterOrEqual(f64),
    IsIn(Vec<String>),
}

impl Check {
    pub fn greater_than(min: f64) -> Self {
        Check::GreaterThan(min)
    }

    pub fn greater_or_equal(min: f64) -> Self {
        Check::GreaterOrEqual(min)
    }

    pub fn isin<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Check::IsIn(values.into_iter().map(Into::into).collect())
    }

    /// Name of the check as it appears in failure cases
    fn name(&self) -> String {
        match self {
            Check::GreaterThan(min) => format!("greater_than({})", min),
            Check::GreaterOrEqual(min) => format!("greater_than_or_equal_to({})", min),
            Check::IsIn(values) => format!("isin({})", values.join(", ")),
        }
    }
}

/// Per-column declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub dtype: DType,
    pub nullable: bool,
    pub check: Option<Check>,
}

impl ColumnSpec {
    pub fn nullable(dtype: DType) -> Self {
        Self {
            dtype,
            nullable: true,
            check: None,
        }
    }

    pub fn required(dtype: DType) -> Self {
        Self {
            dtype,
            nullable: false,
            check: None,
        }
    }

    pub fn with_check(mut self, check: Check) -> Self {
        self.check = Some(check);
        self
    }
}

/// What to do with columns the contract does not declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// Undeclared columns are silently dropped from the validated output
    Filter,
    /// Undeclared columns reject the resource
    Reject,
}

/// One collected validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureCase {
    /// Offending row, when the failure is row-scoped
    pub row: Option<usize>,
    pub column: String,
    /// Name of the violated check, e.g. "not_nullable" or "greater_than(0)"
    pub check: String,
    pub reason: String,
}

impl fmt::Display for FailureCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(
                f,
                "row {}, column '{}': {} ({})",
                row, self.column, self.reason, self.check
            ),
            None => write!(f, "column '{}': {} ({})", self.column, self.reason, self.check),
        }
    }
}

/// The full set of failures from one validation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaErrors {
    pub cases: Vec<FailureCase>,
}

impl SchemaErrors {
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// True if any collected case violated the named check
    pub fn has_check(&self, check: &str) -> bool {
        self.cases.iter().any(|c| c.check.starts_with(check))
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} schema failure case(s)", self.cases.len())?;
        for case in self.cases.iter().take(5) {
            write!(f, "; {}", case)?;
        }
        if self.cases.len() > 5 {
            write!(f, "; ...")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

/// Coerced cell value used for constraint evaluation
enum CellValue<'a> {
    Str(&'a str),
    Num(f64),
}

/// Structural contract for one tabular resource
#[derive(Debug, Clone)]
pub struct SchemaContract {
    columns: Vec<(String, ColumnSpec)>,
    strictness: Strictness,
    ordered: bool,
    unique_key: Option<String>,
}

impl SchemaContract {
    pub fn new<S: Into<String>>(
        columns: Vec<(S, ColumnSpec)>,
        strictness: Strictness,
        ordered: bool,
    ) -> Self {
        Self {
            columns: columns.into_iter().map(|(n, s)| (n.into(), s)).collect(),
            strictness,
            ordered,
            unique_key: None,
        }
    }

    /// Declare a column whose values must be unique within one resource
    pub fn with_unique_key(mut self, column: impl Into<String>) -> Self {
        self.unique_key = Some(column.into());
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    fn declares(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Derive the contract for a resource carrying only `present` columns.
    ///
    /// The result declares the intersection of this contract's columns with
    /// `present`, with strictness relaxed to [`Strictness::Filter`]. The
    /// original contract is untouched, so concurrent validations can share
    /// it read-only.
    pub fn narrowed_to(&self, present: &[String]) -> SchemaContract {
        let columns = self
            .columns
            .iter()
            .filter(|(name, _)| present.contains(name))
            .cloned()
            .collect();
        let unique_key = self
            .unique_key
            .clone()
            .filter(|key| present.contains(key));

        SchemaContract {
            columns,
            strictness: Strictness::Filter,
            ordered: self.ordered,
            unique_key,
        }
    }

    /// Validate the whole table.
    ///
    /// On success, returns the validated view: the table restricted to
    /// declared columns (undeclared ones dropped under
    /// [`Strictness::Filter`]). On failure, returns every collected
    /// violation together.
    pub fn validate(&self, table: &Table) -> Result<Table, SchemaErrors> {
        let rows: Vec<usize> = (0..table.n_rows()).collect();
        let cases = self.collect_failures(table, &rows);
        if cases.is_empty() {
            Ok(self.filtered_view(table))
        } else {
            Err(SchemaErrors { cases })
        }
    }

    /// Smoke-check a deterministic random sample of rows.
    ///
    /// `sample_rows` caps the number of rows inspected; the same seed always
    /// selects the same rows. Contamination in unsampled rows goes
    /// undetected; that is the accepted cost of this mode.
    pub fn validate_sample(
        &self,
        table: &Table,
        sample_rows: usize,
        seed: u64,
    ) -> Result<(), SchemaErrors> {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = sample_rows.min(table.n_rows());
        let mut rows = rand::seq::index::sample(&mut rng, table.n_rows(), n).into_vec();
        rows.sort_unstable();

        let cases = self.collect_failures(table, &rows);
        if cases.is_empty() {
            Ok(())
        } else {
            Err(SchemaErrors { cases })
        }
    }

    /// Run all table- and row-level checks over the given rows, collecting
    /// every violation instead of stopping at the first.
    fn collect_failures(&self, table: &Table, rows: &[usize]) -> Vec<FailureCase> {
        let mut cases = Vec::new();

        if self.strictness == Strictness::Reject {
            for column in table.columns() {
                if !self.declares(column) {
                    cases.push(FailureCase {
                        row: None,
                        column: column.clone(),
                        check: "column_in_schema".to_string(),
                        reason: "column is not declared in the contract".to_string(),
                    });
                }
            }
        }

        for (name, spec) in &self.columns {
            if table.column_index(name).is_none() && !spec.nullable {
                cases.push(FailureCase {
                    row: None,
                    column: name.clone(),
                    check: "column_in_table".to_string(),
                    reason: "required column missing from input".to_string(),
                });
            }
        }

        if self.ordered {
            self.check_order(table, &mut cases);
        }

        for (name, spec) in &self.columns {
            let Some(col) = table.column_index(name) else {
                continue;
            };
            for &row in rows {
                self.check_cell(name, spec, table.cell(row, col), row, &mut cases);
            }
        }

        if let Some(key) = &self.unique_key {
            if let Some(col) = table.column_index(key) {
                let mut seen = HashSet::new();
                for &row in rows {
                    let value = table.cell(row, col);
                    if !seen.insert(value) {
                        cases.push(FailureCase {
                            row: Some(row),
                            column: key.clone(),
                            check: "field_uniqueness".to_string(),
                            reason: format!("duplicate key value '{}'", value),
                        });
                    }
                }
            }
        }

        cases
    }

    /// Declared columns present in the table must keep declaration order.
    fn check_order(&self, table: &Table, cases: &mut Vec<FailureCase>) {
        let mut last_position = None;
        for (name, _) in &self.columns {
            let Some(position) = table.column_index(name) else {
                continue;
            };
            if let Some(last) = last_position {
                if position < last {
                    cases.push(FailureCase {
                        row: None,
                        column: name.clone(),
                        check: "column_ordered".to_string(),
                        reason: "column out of declared order".to_string(),
                    });
                }
            }
            last_position = Some(position);
        }
    }

    fn check_cell(
        &self,
        name: &str,
        spec: &ColumnSpec,
        raw: &str,
        row: usize,
        cases: &mut Vec<FailureCase>,
    ) {
        if is_null(raw) {
            if !spec.nullable {
                cases.push(FailureCase {
                    row: Some(row),
                    column: name.to_string(),
                    check: "not_nullable".to_string(),
                    reason: "null value in non-nullable column".to_string(),
                });
            }
            return;
        }

        let value = match coerce(raw, spec.dtype) {
            Some(value) => value,
            None => {
                cases.push(FailureCase {
                    row: Some(row),
                    column: name.to_string(),
                    check: format!("coerce_dtype('{}')", spec.dtype),
                    reason: format!("value '{}' cannot be coerced to {}", raw, spec.dtype),
                });
                return;
            },
        };

        if let Some(check) = &spec.check {
            if let Some(reason) = evaluate(check, &value) {
                cases.push(FailureCase {
                    row: Some(row),
                    column: name.to_string(),
                    check: check.name(),
                    reason,
                });
            }
        }
    }

    /// The table restricted to declared columns, in table order.
    fn filtered_view(&self, table: &Table) -> Table {
        let keep: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| self.declares(c.as_str()))
            .cloned()
            .collect();
        table.select_columns(&keep)
    }
}

/// Null cell detection, matching what a permissive CSV reader treats as NA
fn is_null(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty()
        || matches!(trimmed, "NA" | "N/A" | "NaN" | "nan" | "NULL" | "null" | "None")
}

/// Coerce a raw cell to its declared type
fn coerce(raw: &str, dtype: DType) -> Option<CellValue<'_>> {
    let trimmed = raw.trim();
    match dtype {
        DType::Str => Some(CellValue::Str(trimmed)),
        DType::Float => trimmed.parse::<f64>().ok().map(CellValue::Num),
        DType::Int => {
            if let Ok(value) = trimmed.parse::<i64>() {
                return Some(CellValue::Num(value as f64));
            }
            // Integral-valued float text ("120.0") coerces the way a
            // type-coercing frame reader would accept it.
            match trimmed.parse::<f64>() {
                Ok(value) if value.is_finite() && value.fract() == 0.0 => {
                    Some(CellValue::Num(value))
                },
                _ => None,
            }
        },
    }
}

/// Returns the failure reason if the check does not hold
fn evaluate(check: &Check, value: &CellValue<'_>) -> Option<String> {
    match (check, value) {
        (Check::GreaterThan(min), CellValue::Num(v)) => {
            (*v <= *min).then(|| format!("value {} is not greater than {}", v, min))
        },
        (Check::GreaterOrEqual(min), CellValue::Num(v)) => {
            (*v < *min).then(|| format!("value {} is less than {}", v, min))
        },
        (Check::IsIn(allowed), CellValue::Str(v)) => (!allowed.iter().any(|a| a == v))
            .then(|| format!("value '{}' is not in the allowed set", v)),
        (Check::IsIn(allowed), CellValue::Num(v)) => {
            (!allowed.iter().any(|a| a.parse::<f64>() == Ok(*v)))
                .then(|| format!("value {} is not in the allowed set", v))
        },
        // Numeric range checks on string columns compare nothing; a contract
        // that wants them should declare the column numeric.
        (Check::GreaterThan(_), CellValue::Str(_))
        | (Check::GreaterOrEqual(_), CellValue::Str(_)) => None,
    }
}
