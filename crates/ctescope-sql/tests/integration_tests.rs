//! Integration tests for segmentation and reference extraction

use ctescope_core::{TableReference, MAIN_QUERY};
use ctescope_sql::{extract_references, segment, QueryAnalyzer, SqlParser};
use pretty_assertions::assert_eq;

fn reference(
    database: Option<&str>,
    schema: Option<&str>,
    table: &str,
    alias: &str,
) -> TableReference {
    TableReference {
        database: database.map(str::to_string),
        schema: schema.map(str::to_string),
        table: table.to_string(),
        alias: alias.to_string(),
    }
}

#[test]
fn segment_then_extract_single_cte() {
    let sql = "WITH c1 AS (SELECT * FROM db1.dbo.t1 t1 INNER JOIN dbo.t2 ON t2.id=t1.id) SELECT * FROM c1";

    let segmented = segment(sql).unwrap();
    assert_eq!(segmented.ctes.len(), 1);
    assert_eq!(segmented.ctes[0].name, "c1");
    assert_eq!(
        segmented.ctes[0].body,
        "SELECT * FROM db1.dbo.t1 t1 INNER JOIN dbo.t2 ON t2.id=t1.id"
    );

    let parser = SqlParser::mssql();
    let parsed = parser.parse(&segmented.ctes[0].body, "c1").unwrap();
    let refs = extract_references(parsed.first_statement().unwrap());

    assert_eq!(
        refs,
        vec![
            reference(Some("db1"), Some("dbo"), "t1", "t1"),
            reference(None, Some("dbo"), "t2", "t2"),
        ]
    );
}

#[test]
fn multi_cte_union_workflow() {
    // Three CTEs with joins and nested subqueries, a comma-join main query
    // UNION'd with two more SELECTs, one of which carries an IN-subquery.
    let sql = r#"
        with
        c1 as
        (
            select * from db1.dbo.table1  t1
            inner join dbo.xx2 as x2 on x2.id = t1.xx2_id
            where x2.name like 'abc%'
        ),
        ct2 as
        (
            select * from dbo.table2 where id > 20
        ),
        cte3 as
        (
            select * from db44.dbo.table3
            left join table33  on table3.id = table33.t3_id
            where price < 100
        )
        select a.id, b.name, c.order_id from c1 a, ct2 b, cte3 c where a.id = b.id and a.id = c.id
        union
        SELECT u.id, u.name, o.order_id
        FROM database1.schema1.users u
            LEFT JOIN schema2.orders o ON u.id = o.user_id
        WHERE u.age > 18
            AND u.id IN (
                SELECT user_id
                FROM database2.schema2.transactions
                WHERE amount > 100
            )
        UNION
        SELECT a.id, a.name, b.order_id
        FROM db2.schema3.account a
            INNER JOIN schema4.billing b ON a.id = b.account_id
    "#;

    let analysis = QueryAnalyzer::new().analyze(sql).unwrap();

    let names: Vec<&str> = analysis.fragments.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["c1", "ct2", "cte3", MAIN_QUERY]);

    assert_eq!(
        analysis.fragments[0].references,
        vec![
            reference(Some("db1"), Some("dbo"), "table1", "t1"),
            reference(None, Some("dbo"), "xx2", "x2"),
        ]
    );

    assert_eq!(
        analysis.fragments[1].references,
        vec![reference(None, Some("dbo"), "table2", "table2")]
    );

    assert_eq!(
        analysis.fragments[2].references,
        vec![
            reference(Some("db44"), Some("dbo"), "table3", "table3"),
            reference(None, None, "table33", "table33"),
        ]
    );

    // Main query: comma-join branch first, then each UNION branch left to
    // right. The IN-subquery table (database2.schema2.transactions) is not a
    // FROM source and is not extracted.
    assert_eq!(
        analysis.main_fragment().references,
        vec![
            reference(None, None, "c1", "a"),
            reference(None, None, "ct2", "b"),
            reference(None, None, "cte3", "c"),
            reference(Some("database1"), Some("schema1"), "users", "u"),
            reference(None, Some("schema2"), "orders", "o"),
            reference(Some("db2"), Some("schema3"), "account", "a"),
            reference(None, Some("schema4"), "billing", "b"),
        ]
    );

    assert_eq!(analysis.all_diagnostics().count(), 0);
}

#[test]
fn union_inside_a_cte_body() {
    let sql = "WITH c1 AS (SELECT id FROM sch1.a UNION SELECT id FROM sch2.b) SELECT * FROM c1";

    let analysis = QueryAnalyzer::new().analyze(sql).unwrap();
    assert_eq!(
        analysis.fragments[0].references,
        vec![
            reference(None, Some("sch1"), "a", "a"),
            reference(None, Some("sch2"), "b", "b"),
        ]
    );
}

#[test]
fn plain_query_without_with_clause() {
    let analysis = QueryAnalyzer::new()
        .analyze("select * from ioa.dbo.user_items where user_id = 1")
        .unwrap();

    assert_eq!(analysis.fragments.len(), 1);
    assert_eq!(
        analysis.main_fragment().references,
        vec![reference(Some("ioa"), Some("dbo"), "user_items", "user_items")]
    );
}

#[test]
fn report_round_trips_through_json() {
    let sql = "WITH c1 AS (SELECT * FROM dbo.t1) SELECT * FROM c1";
    let report = QueryAnalyzer::new().analyze(sql).unwrap().to_report();

    assert_eq!(report.summary.fragments_analyzed, 2);
    assert_eq!(report.summary.tables_resolved, 2);
    assert!(!report.has_errors());

    let json = report.to_json().unwrap();
    let parsed: ctescope_core::Report = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, report);
}

#[test]
fn derived_table_surfaces_as_warning_not_error() {
    let sql = "WITH c1 AS (SELECT * FROM (SELECT id FROM raw_t) d) SELECT * FROM c1";
    let analysis = QueryAnalyzer::new().analyze(sql).unwrap();

    assert!(analysis.fragments[0].references.is_empty());

    let report = analysis.to_report();
    assert_eq!(report.summary.unresolved_exprs, 1);
    assert_eq!(report.summary.warnings, 1);
    assert!(!report.has_errors());
}
