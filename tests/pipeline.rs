use rusty_merge::{
    join, load, select, to_csv_bytes, to_xlsx_bytes, ErrorKind, JoinMode, JoinSpec, LoadOptions, MergeConfig,
    RustyMergeError, Session, Side, Table, Value,
};

const CUSTOMERS: &[u8] = b"id,name,region\n1,Ana,north\n2,Bruno,south\n3,Carla,north\n";
const ORDERS: &[u8] = b"customer_id,region,total\n2,south,10.5\n2,south,4\n3,east,7\n9,west,1\n";

fn typed() -> LoadOptions {
    LoadOptions {
        preserve_format: false,
        ..LoadOptions::default()
    }
}

fn tables() -> (Table, Table) {
    let a = load(CUSTOMERS, "customers.csv", &typed()).unwrap();
    let b = load(ORDERS, "orders.csv", &typed()).unwrap();
    (a, b)
}

#[test]
fn csv_join_select_and_xlsx_round_trip() {
    let (a, b) = tables();
    let spec = JoinSpec::new(["id"], ["customer_id"], JoinMode::Left);
    let result = join(&a, &b, &spec).unwrap();
    assert_eq!(
        result.table.columns(),
        &["id", "name", "region_A", "customer_id", "region_B", "total"]
    );
    // Ana has no order, Bruno has two, Carla has one
    assert_eq!(result.table.row_count(), 4);
    assert_eq!(result.stats.rows_a, 3);
    assert_eq!(result.stats.matched, 3);
    assert_eq!(result.stats.unmatched_a, 1);
    assert_eq!(result.stats.unmatched_b, 1);

    let narrowed = select(&result.table, &["name", "total"]).unwrap();
    assert_eq!(select(&narrowed, &["name", "total"]).unwrap(), narrowed);

    let bytes = to_xlsx_bytes(&narrowed).unwrap();
    let reloaded = load(&bytes, "merged.xlsx", &typed()).unwrap();
    assert_eq!(reloaded.columns(), narrowed.columns());
    assert_eq!(reloaded.rows(), narrowed.rows());
    assert_eq!(reloaded.get(0, "total"), Some(&Value::Null));
    assert_eq!(reloaded.get(1, "total"), Some(&Value::from(10.5)));
}

#[test]
fn anti_join_partitions_the_driving_table() {
    let (a, b) = tables();
    let anti = join(&a, &b, &JoinSpec::new(["id"], ["customer_id"], JoinMode::AntiANotB)).unwrap();
    let inner = join(&a, &b, &JoinSpec::new(["id"], ["customer_id"], JoinMode::Inner)).unwrap();
    assert_eq!(anti.table.columns(), a.columns());
    assert_eq!(anti.table.row_count(), 1);
    assert_eq!(anti.table.get(0, "name"), Some(&Value::from("Ana")));
    assert_eq!(anti.table.row_count() + inner.stats.rows_a - inner.stats.unmatched_a, a.row_count());
}

#[test]
fn composite_keys_with_different_names() {
    let (a, b) = tables();
    let spec = JoinSpec::new(["id", "region"], ["customer_id", "region"], JoinMode::Inner);
    let result = join(&a, &b, &spec).unwrap();
    // Carla is north in A and east in B
    assert_eq!(result.table.row_count(), 2);
    assert!(result
        .table
        .rows()
        .iter()
        .all(|row| row[1] == Value::from("Bruno")));
}

#[test]
fn session_writes_csv_and_configuration() {
    let dir = std::env::temp_dir().join(format!("rusty_merge_pipeline_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let mut session = Session::default();
    session.upload(Side::A, CUSTOMERS, "customers.csv", None).unwrap();
    session.upload(Side::B, ORDERS, "orders.csv", None).unwrap();
    session.choose_keys(&["id"], &["customer_id"]).unwrap();
    session.choose_mode(JoinMode::Outer);
    session.choose_columns(&["id", "name"], &["customer_id", "total"]).unwrap();
    let rows = session.execute().unwrap().table.row_count();
    assert_eq!(rows, 5);

    let written = session.save(dir.join("result.csv")).unwrap();
    let csv = std::fs::read_to_string(&written).unwrap();
    assert!(csv.starts_with("id,name,customer_id,total\n"));
    assert_eq!(csv.lines().count(), rows + 1);

    let config_path = dir.join("merge.json");
    session.merge_config().save(&config_path).unwrap();
    let config = MergeConfig::load(&config_path).unwrap();
    assert_eq!(config.join_type, Some(JoinMode::Outer));
    assert_eq!(config.join_keys_b, vec!["customer_id"]);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn errors_carry_their_category() {
    let error = load(b"a,b\n", "notes.txt", &LoadOptions::default()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Format);

    let error = load(b"a,b\n1,2,3\n", "broken.csv", &LoadOptions::default()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Parse);

    let (a, b) = tables();
    let error = join(&a, &b, &JoinSpec::new(["missing_col"], ["customer_id"], JoinMode::Inner)).unwrap_err();
    assert!(error.to_string().contains("missing_col"));
    assert_eq!(RustyMergeError::from(error).kind(), ErrorKind::Validation);

    let csv = String::from_utf8(to_csv_bytes(&a).unwrap()).unwrap();
    assert_eq!(csv.lines().next(), Some("id,name,region"));
}

#[test]
fn unmatched_rows_survive_xlsx_export() {
    let a = Table::new(
        vec!["id".into(), "name".into()],
        vec![
            vec![Value::from(5), Value::from("w")],
            vec![Value::from(2), Value::from("y")],
        ],
    )
    .unwrap();
    let b = Table::new(
        vec!["id".into(), "val".into()],
        vec![
            vec![Value::from(2), Value::from("p")],
            vec![Value::from(1), Value::from("q")],
            vec![Value::from(9), Value::from("z")],
        ],
    )
    .unwrap();
    let joined = join(&a, &b, &JoinSpec::new(["id"], ["id"], JoinMode::Left)).unwrap();
    let narrowed = select(&joined.table, &["val"]).unwrap();
    assert_eq!(narrowed.rows(), &[vec![Value::Null], vec![Value::from("p")]]);

    let reloaded = load(&to_xlsx_bytes(&narrowed).unwrap(), "merged.xlsx", &typed()).unwrap();
    assert_eq!(reloaded, narrowed);
}
