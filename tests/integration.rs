use csvdb::executor::QueryResult;
use csvdb::storage::TableManifest;
use csvdb::types::{DatabaseError, ScalarType, Value};
use csvdb::{Parser, Session, Statement};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn session() -> (TempDir, Session) {
    let root = TempDir::new().unwrap();
    let session = Session::open(root.path()).unwrap();
    (root, session)
}

fn rows(session: &mut Session, sql: &str) -> Vec<Vec<Value>> {
    match session.execute_sql(sql).unwrap() {
        QueryResult::Rows(stream) => stream.collect::<Result<_, _>>().unwrap(),
        other => panic!("Expected rows from {sql}, got {other:?}"),
    }
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_create_then_drop_leaves_no_residue() {
    let (root, mut session) = session();
    fs::write(root.path().join("keep.txt"), "x").unwrap();
    let before = listing(root.path());

    session
        .execute_sql("CREATE TABLE t (name VARCHAR, n INT, x FLOAT, at TIMESTAMP);")
        .unwrap();
    assert_ne!(listing(root.path()), before);
    session.execute_sql("DROP TABLE t;").unwrap();
    assert_eq!(listing(root.path()), before);
}

#[test]
fn test_create_if_not_exists_keeps_first_schema() {
    let (root, mut session) = session();
    session
        .execute_sql("CREATE TABLE IF NOT EXISTS t (a INT, b VARCHAR);")
        .unwrap();
    let outcome = session
        .execute_sql("CREATE TABLE IF NOT EXISTS t (c FLOAT);")
        .unwrap();
    assert!(matches!(outcome, QueryResult::Skipped(_)));

    let manifest = TableManifest::read(&root.path().join("t")).unwrap();
    let schema: Vec<(&str, ScalarType)> = manifest
        .schema
        .iter()
        .map(|f| (f.field.as_str(), f.scalar_type))
        .collect();
    assert_eq!(schema, [("a", ScalarType::Int), ("b", ScalarType::Varchar)]);
}

#[test]
fn test_load_blank_int_becomes_null() {
    let (root, mut session) = session();
    session.execute_sql("CREATE TABLE t (id INT, name VARCHAR);").unwrap();
    fs::write(root.path().join("t.csv"), "id,name\n7,seven\n,unknown\n").unwrap();
    session
        .execute_sql("LOAD DATA INFILE \"t.csv\" INTO TABLE t IGNORE 1 LINES;")
        .unwrap();

    let manifest = TableManifest::read(&root.path().join("t")).unwrap();
    assert_eq!(manifest.rows, 2);

    // The blank field is stored as the int sentinel.
    let stored = fs::read(root.path().join("t").join("id.col")).unwrap();
    assert_eq!(&stored[8..16], &i64::MIN.to_le_bytes());

    assert_eq!(
        rows(&mut session, "SELECT * FROM t;"),
        vec![
            vec![Value::Int(7), Value::Varchar("seven".to_string())],
            vec![Value::Null, Value::Varchar("unknown".to_string())],
        ]
    );
}

#[test]
fn test_select_missing_table_touches_nothing() {
    let (root, mut session) = session();
    let err = session.execute_sql("SELECT * FROM missing_table;").unwrap_err();
    assert!(matches!(err, DatabaseError::TableNotExists(name) if name == "missing_table"));
    assert!(listing(root.path()).is_empty());
}

#[test]
fn test_script_recovers_from_syntax_error() {
    let script = "CREATE TABLE a (x INT);\nDROP TABLE a b;\nDROP TABLE a;";
    let results: Vec<_> = Parser::new(script).collect();
    assert_eq!(results.len(), 3);
    let err = results[1].as_ref().unwrap_err();
    assert_eq!((err.line, err.col), (2, 14));
    assert_eq!(err.location_marker(), "DROP TABLE a b;\n             ^");
    assert!(matches!(results[2], Ok(Statement::DropTable { .. })));

    let (root, mut session) = session();
    let mut errors = 0;
    session.run_script(script, |outcome| {
        if outcome.is_err() {
            errors += 1;
        }
    });
    assert_eq!(errors, 1);
    assert!(listing(root.path()).is_empty());
}

#[test]
fn test_full_query_pipeline() {
    let (root, mut session) = session();
    session
        .execute_sql("CREATE TABLE sales (region VARCHAR, units INT, price FLOAT, sold TIMESTAMP);")
        .unwrap();
    fs::write(
        root.path().join("sales.csv"),
        "north,10,2.5,2024-01-01\nsouth,3,4.0,2024-01-02\nnorth,5,,2024-01-03\neast,8,1.0,\nsouth,1,9.5,2024-02-01\n",
    )
    .unwrap();
    session
        .execute_sql("LOAD DATA INFILE \"sales.csv\" INTO TABLE sales;")
        .unwrap();

    let result = rows(
        &mut session,
        "SELECT region, SUM(units) AS total, COUNT(price) FROM sales WHERE units > 1 \
         GROUP BY region HAVING total >= 8 ORDER BY total DESC;",
    );
    assert_eq!(
        result,
        vec![
            vec![Value::Varchar("north".to_string()), Value::Int(15), Value::Int(1)],
            vec![Value::Varchar("east".to_string()), Value::Int(8), Value::Int(1)],
        ]
    );

    let january = rows(
        &mut session,
        "SELECT region FROM sales WHERE sold < \"2024-02-01\" ORDER BY region;",
    );
    assert_eq!(january.len(), 3);
    assert_eq!(january[0], vec![Value::Varchar("north".to_string())]);

    let undated = rows(&mut session, "SELECT region FROM sales WHERE sold IS NULL;");
    assert_eq!(undated, vec![vec![Value::Varchar("east".to_string())]]);
}

#[test]
fn test_outfile_and_create_as_select() {
    let (root, mut session) = session();
    session.execute_sql("CREATE TABLE t (k VARCHAR, v INT);").unwrap();
    fs::write(root.path().join("in.csv"), "\"a, b\",1\nc,\n").unwrap();
    session.execute_sql("LOAD DATA INFILE \"in.csv\" INTO TABLE t;").unwrap();

    let outcome = session
        .execute_sql("SELECT * INTO OUTFILE \"out.csv\" FROM t;")
        .unwrap();
    assert!(matches!(outcome, QueryResult::Success(msg) if msg.starts_with("2 rows written")));
    assert_eq!(
        fs::read_to_string(root.path().join("out.csv")).unwrap(),
        "k,v\n\"a, b\",1\nc,\n"
    );

    session
        .execute_sql("CREATE TABLE copy AS SELECT v AS value, k FROM t ORDER BY k DESC;")
        .unwrap();
    assert_eq!(
        rows(&mut session, "SELECT * FROM copy;"),
        vec![
            vec![Value::Null, Value::Varchar("c".to_string())],
            vec![Value::Int(1), Value::Varchar("a, b".to_string())],
        ]
    );
    let manifest = TableManifest::read(&root.path().join("copy")).unwrap();
    assert_eq!(manifest.rows, 2);
    assert_eq!(manifest.schema[0].field, "value");
    assert_eq!(manifest.schema[0].scalar_type, ScalarType::Int);
}

#[test]
fn test_table_handles_survive_new_sessions() {
    let (root, mut session) = session();
    session.execute_sql("CREATE TABLE t (v INT);").unwrap();
    fs::write(root.path().join("in.csv"), "1\n2\n").unwrap();
    session.execute_sql("LOAD DATA INFILE \"in.csv\" INTO TABLE t;").unwrap();
    drop(session);

    let mut reopened = Session::open(root.path()).unwrap();
    assert_eq!(
        rows(&mut reopened, "SELECT MAX(v) AS top FROM t;"),
        vec![vec![Value::Int(2)]]
    );
}

#[test]
fn test_foreign_directory_blocks_create() {
    let (root, mut session) = session();
    fs::create_dir(root.path().join("t")).unwrap();
    fs::write(root.path().join("t").join("readme.md"), "hi").unwrap();
    assert!(matches!(
        session.execute_sql("CREATE TABLE IF NOT EXISTS t (v INT);"),
        Err(DatabaseError::DirectoryAlreadyExists(_))
    ));
    assert!(matches!(
        session.execute_sql("SELECT * FROM t;"),
        Err(DatabaseError::TableNotExists(_))
    ));
}

#[test]
fn test_order_by_ties_keep_load_order() {
    let (root, mut session) = session();
    session
        .execute_sql("CREATE TABLE items (category VARCHAR, label VARCHAR, n INT);")
        .unwrap();
    fs::write(
        root.path().join("items.csv"),
        "b,first,1\na,second,2\nb,third,3\na,fourth,4\nb,fifth,5\n",
    )
    .unwrap();
    session
        .execute_sql("LOAD DATA INFILE \"items.csv\" INTO TABLE items;")
        .unwrap();

    let labels = |session: &mut Session, sql: &str| -> Vec<String> {
        rows(session, sql).iter().map(|row| row[0].to_string()).collect()
    };
    assert_eq!(
        labels(&mut session, "SELECT label FROM items ORDER BY category;"),
        ["second", "fourth", "first", "third", "fifth"]
    );
    assert_eq!(
        labels(&mut session, "SELECT label FROM items ORDER BY category DESC;"),
        ["first", "third", "fifth", "second", "fourth"]
    );
}

#[test]
fn test_signed_zeros_share_a_group() {
    let (root, mut session) = session();
    session.execute_sql("CREATE TABLE t (x FLOAT);").unwrap();
    fs::write(root.path().join("zeros.csv"), "0.0\n-0.0\n").unwrap();
    session
        .execute_sql("LOAD DATA INFILE \"zeros.csv\" INTO TABLE t;")
        .unwrap();

    assert_eq!(rows(&mut session, "SELECT x FROM t WHERE x = 0;").len(), 2);
    let groups = rows(&mut session, "SELECT x, COUNT(x) FROM t GROUP BY x;");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0][1], Value::Int(2));
}

#[test]
fn test_empty_timestamp_sum_is_not_stored_as_null() {
    let (root, mut session) = session();
    session.execute_sql("CREATE TABLE t (at TIMESTAMP, n INT);").unwrap();
    fs::write(root.path().join("blank.csv"), ",1\n,2\n").unwrap();
    session
        .execute_sql("LOAD DATA INFILE \"blank.csv\" INTO TABLE t;")
        .unwrap();

    assert!(matches!(
        session.execute_sql("SELECT SUM(at) AS s FROM t;"),
        Err(DatabaseError::EmptyAggregate(_))
    ));
    assert!(matches!(
        session.execute_sql("CREATE TABLE c AS SELECT SUM(at) AS s FROM t;"),
        Err(DatabaseError::EmptyAggregate(_))
    ));
    assert!(!root.path().join("c").exists());
}
