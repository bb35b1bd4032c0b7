//! Canonical table order and result grouping.
//!
//! # Order
//! Nastran writes tables in Case Control order.  We do not have a deck, so
//! the order is fixed by [`TABLE_ORDER`]: eigenvalue tables first, then
//! displacement-like, forces, element forces, stresses, strains, and finally
//! grid-point and energy tables.  The list is closed.  A table code not in it
//! cannot be written.
//!
//! # Dispatch
//! [`group_by_table`] walks every category and every result of a model once,
//! validates each table code, and returns the groups sorted by canonical
//! position.  Validation covers the whole model before the caller emits a
//! single table byte.

use std::collections::BTreeMap;
use tracing::debug;

use crate::error::WriteError;
use crate::model::ResultModel;
use crate::result::TableResult;

/// Every table code the writer knows, in output order.
pub const TABLE_ORDER: &[&str] = &[
    // eigenvalues
    "LAMA", "BLAMA", "CLAMA",

    "OUGV1", "BOUGV1", "OUPV1", "OAGATO1",

    "OQG1", "OQMG1", "OQP1",

    "OPGV1", "OPG1", "OPNL1",

    "DOEF1", "HOEF1",
    "OEF1", "OEF1X",
    "OEFATO1",

    "OESNLXD", "OESNLXR", "OESNL1X",
    "OES1", "OES1X", "OES1X1",
    "OES1C",
    "OESCP",
    "OESPSD1",
    "OESPSD2",

    "OESTRCP",
    "OSTR1C",
    "OSTR1X",

    "OGPFB1",
    "ONRGY1",
    "OGS1",
];

/// Position of `table_name` in [`TABLE_ORDER`], or `None` if unknown.
pub fn table_position(table_name: &str) -> Option<usize> {
    TABLE_ORDER.iter().position(|t| *t == table_name)
}

// ── TableGroup ───────────────────────────────────────────────────────────────

/// All results sharing one table code, in model iteration order.
pub struct TableGroup<'m> {
    pub table_name: &'static str,
    pub results:    Vec<&'m dyn TableResult>,
}

impl TableGroup<'_> {
    pub fn len(&self) -> usize { self.results.len() }
    pub fn is_empty(&self) -> bool { self.results.is_empty() }
}

/// Group every result of `model` by table code, in canonical order.
///
/// Fails with [`WriteError::UnknownTable`] on the first result whose code is
/// not in [`TABLE_ORDER`].  Canonical tables with no results are skipped.
pub fn group_by_table(model: &ResultModel) -> Result<Vec<TableGroup<'_>>, WriteError> {
    group_results(model.results().map(|r| r as &dyn TableResult))
}

/// [`group_by_table`] over an arbitrary result sequence.
pub fn group_results<'m, I>(results: I) -> Result<Vec<TableGroup<'m>>, WriteError>
where
    I: IntoIterator<Item = &'m dyn TableResult>,
{
    let mut by_position: BTreeMap<usize, Vec<&'m dyn TableResult>> = BTreeMap::new();
    for result in results {
        let table = result.table_name();
        let pos = table_position(table).ok_or_else(|| WriteError::UnknownTable {
            table:   table.to_string(),
            kind:    result.kind().to_string(),
            subcase: result.subcase_id(),
        })?;
        by_position.entry(pos).or_default().push(result);
    }

    let groups: Vec<TableGroup<'m>> = by_position
        .into_iter()
        .map(|(pos, results)| TableGroup { table_name: TABLE_ORDER[pos], results })
        .collect();
    debug!(
        "dispatched {} table(s): {:?}",
        groups.len(),
        groups.iter().map(|g| g.table_name).collect::<Vec<_>>()
    );
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::RecordedResult;
    use chrono::NaiveDate;

    fn model(entries: &[(&str, &str, i32)]) -> ResultModel {
        let mut m = ResultModel::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        for (category, table, subcase) in entries {
            m.add_result(category, Box::new(RecordedResult::new(table, *subcase)));
        }
        m
    }

    #[test]
    fn order_has_no_duplicates() {
        for (i, t) in TABLE_ORDER.iter().enumerate() {
            assert_eq!(table_position(t), Some(i), "{t} listed twice");
        }
    }

    #[test]
    fn groups_follow_canonical_order() {
        let m = model(&[
            ("stress", "OES1X", 1),
            ("disp", "OUGV1", 1),
            ("stress", "OES1X", 2),
            ("eigen", "LAMA", 1),
            ("spc", "OQG1", 1),
        ]);
        let groups = group_by_table(&m).unwrap();
        let names: Vec<&str> = groups.iter().map(|g| g.table_name).collect();
        assert_eq!(names, vec!["LAMA", "OUGV1", "OQG1", "OES1X"]);

        let stress: Vec<i32> = groups[3].results.iter().map(|r| r.subcase_id()).collect();
        assert_eq!(stress, vec![1, 2]);
    }

    #[test]
    fn entries_keep_model_order_across_categories() {
        let m = model(&[
            ("cquad4_stress", "OES1X", 2),
            ("ctria3_stress", "OES1X", 1),
            ("cquad4_stress", "OES1X", 1),
        ]);
        let groups = group_by_table(&m).unwrap();
        assert_eq!(groups.len(), 1);
        let subcases: Vec<i32> = groups[0].results.iter().map(|r| r.subcase_id()).collect();
        assert_eq!(subcases, vec![2, 1, 1]);
    }

    #[test]
    fn unknown_table_is_rejected() {
        let m = model(&[("disp", "OUGV1", 1), ("junk", "ZZZZ", 4)]);
        match group_by_table(&m) {
            Err(WriteError::UnknownTable { table, subcase, .. }) => {
                assert_eq!(table, "ZZZZ");
                assert_eq!(subcase, 4);
            }
            other => panic!("expected UnknownTable, got {:?}", other.map(|g| g.len())),
        }
    }

    #[test]
    fn empty_model_has_no_groups() {
        let m = model(&[]);
        assert!(group_by_table(&m).unwrap().is_empty());
        assert_eq!(table_position("ZZZZ"), None);
    }
}
