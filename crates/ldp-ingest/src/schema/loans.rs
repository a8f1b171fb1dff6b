//! Structural contract for the SBA 7(a)/504 FOIA loan extract
//!
//! Smoke-level checks only: column presence, basic types, nullability, and
//! a handful of range/set constraints on the fields downstream feature
//! engineering cannot tolerate being wrong. Business-rule validation is a
//! later stage's problem.

use super::{Check, ColumnSpec, DType::*, SchemaContract, Strictness};

/// Loan status codes that appear in the FOIA extracts
pub const LOAN_STATUS_VALUES: [&str; 6] =
    ["PIF", "CHGOFF", "CANCLD", "EXEMPT", "NOT FUNDED", "COMMIT"];

/// Contract covering the full column universe of the loan extracts.
///
/// Older catalog years carry only a subset of these columns; narrow the
/// contract to a file's columns before validating it (see
/// [`SchemaContract::narrowed_to`]). Undeclared columns are filtered, not
/// rejected, and column order is not enforced.
pub fn loan_smoke_contract() -> SchemaContract {
    SchemaContract::new(
        vec![
            ("AsOfDate", ColumnSpec::nullable(Str)),
            ("Program", ColumnSpec::nullable(Str)),
            ("BorrName", ColumnSpec::nullable(Str)),
            ("BorrStreet", ColumnSpec::nullable(Str)),
            ("BorrCity", ColumnSpec::nullable(Str)),
            ("BorrState", ColumnSpec::nullable(Str)),
            ("BorrZip", ColumnSpec::nullable(Int)),
            ("LocationID", ColumnSpec::nullable(Float)),
            ("CDC_Name", ColumnSpec::nullable(Str)),
            ("CDC_Street", ColumnSpec::nullable(Str)),
            ("CDC_City", ColumnSpec::nullable(Str)),
            ("CDC_State", ColumnSpec::nullable(Str)),
            ("CDC_Zip", ColumnSpec::nullable(Float)),
            // Known-dirty upstream field; typed loosely on purpose
            ("ThirdPartyLender_Name", ColumnSpec::nullable(Str)),
            ("ThirdPartyLender_City", ColumnSpec::nullable(Str)),
            ("ThirdPartyLender_State", ColumnSpec::nullable(Str)),
            ("ThirdPartyDollars", ColumnSpec::nullable(Float)),
            (
                "GrossApproval",
                ColumnSpec::required(Float).with_check(Check::greater_than(0.0)),
            ),
            ("ApprovalDate", ColumnSpec::nullable(Str)),
            ("ApprovalFiscalYear", ColumnSpec::nullable(Int)),
            ("FirstDisbursementDate", ColumnSpec::nullable(Str)),
            ("ProcessingMethod", ColumnSpec::nullable(Str)),
            ("Subprogram", ColumnSpec::nullable(Str)),
            (
                "TermInMonths",
                ColumnSpec::required(Int).with_check(Check::greater_or_equal(0.0)),
            ),
            ("NaicsCode", ColumnSpec::nullable(Float)),
            ("NaicsDescription", ColumnSpec::nullable(Str)),
            ("FranchiseCode", ColumnSpec::nullable(Str)),
            ("FranchiseName", ColumnSpec::nullable(Str)),
            ("ProjectCounty", ColumnSpec::nullable(Str)),
            ("ProjectState", ColumnSpec::nullable(Str)),
            ("SBADistrictOffice", ColumnSpec::nullable(Str)),
            ("CongressionalDistrict", ColumnSpec::nullable(Float)),
            ("BusinessType", ColumnSpec::nullable(Str)),
            ("BusinessAge", ColumnSpec::nullable(Str)),
            (
                "LoanStatus",
                ColumnSpec::nullable(Str).with_check(Check::isin(LOAN_STATUS_VALUES)),
            ),
            ("PaidInFullDate", ColumnSpec::nullable(Str)),
            ("ChargeOffDate", ColumnSpec::nullable(Str)),
            ("GrossChargeOffAmount", ColumnSpec::nullable(Int)),
            ("JobsSupported", ColumnSpec::nullable(Int)),
            ("CollateralInd", ColumnSpec::nullable(Str)),
        ],
        Strictness::Filter,
        false,
    )
}
