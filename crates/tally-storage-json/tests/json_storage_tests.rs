use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tally_core::CompanyStore;
use tally_domain::{
    Budget, BudgetCategory, BudgetPeriod, CategoryKind, Company, JournalEntry, JournalLine,
};
use tally_storage_json::{JsonCompanyStore, StoragePaths};
use tempfile::tempdir;
use uuid::Uuid;

fn sample_company() -> Company {
    let mut company = Company::new("StorageTest");
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
    let mut budget = Budget::new("FY25", BudgetPeriod::Yearly, start, end);
    budget.categories.push(
        BudgetCategory::new("Rent", CategoryKind::Expense, dec!(12000)).with_actual(dec!(3000.25)),
    );
    company.budgets.push(budget);
    company.journal_entries.push(JournalEntry::new(start, "Opening").with_lines([
        JournalLine::debit("Cash", dec!(500)),
        JournalLine::credit("Equity", dec!(500)),
    ]));
    company
}

#[test]
fn json_store_saves_and_loads_company() {
    let dir = tempdir().expect("tempdir");
    let store = JsonCompanyStore::new(StoragePaths::under(dir.path())).expect("create store");
    let company = sample_company();

    store.save(&company).expect("save company");
    let loaded = store
        .load(company.id)
        .expect("load company")
        .expect("company exists");

    assert_eq!(loaded, company);
    let path = store.company_path(company.id);
    assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("json"));
    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn json_store_returns_none_for_unknown_company() {
    let dir = tempdir().expect("tempdir");
    let store = JsonCompanyStore::new(StoragePaths::under(dir.path())).expect("create store");
    assert!(store.load(Uuid::new_v4()).expect("load").is_none());
}

#[test]
fn json_store_lists_and_deletes() {
    let dir = tempdir().expect("tempdir");
    let store = JsonCompanyStore::new(StoragePaths::under(dir.path())).expect("create store");
    let first = Company::new("First");
    let second = Company::new("Second");
    store.save(&first).unwrap();
    store.save(&second).unwrap();

    let mut expected = vec![first.id, second.id];
    expected.sort();
    assert_eq!(store.list().unwrap(), expected);

    store.delete(first.id).unwrap();
    assert_eq!(store.list().unwrap(), vec![second.id]);
    store.delete(first.id).expect("deleting twice is fine");
}

#[test]
fn overwriting_keeps_a_backup_of_the_previous_version() {
    let dir = tempdir().expect("tempdir");
    let paths = StoragePaths::under(dir.path());
    let store = JsonCompanyStore::with_retention(paths, 3).expect("create store");
    let mut company = sample_company();
    store.save(&company).unwrap();
    assert!(store.list_backups(company.id).unwrap().is_empty());

    company.name = "Renamed".into();
    store.save(&company).unwrap();

    let backups = store.list_backups(company.id).unwrap();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].created_at.is_some());

    let restored = store.restore_backup(&backups[0]).expect("restore");
    assert_eq!(restored.name, "StorageTest");
    let current = store.load(company.id).unwrap().unwrap();
    assert_eq!(current.name, "StorageTest");
}

#[test]
fn corrupt_file_is_a_serde_error() {
    let dir = tempdir().expect("tempdir");
    let store = JsonCompanyStore::new(StoragePaths::under(dir.path())).expect("create store");
    let id = Uuid::new_v4();
    std::fs::write(store.company_path(id), "{ not json").unwrap();

    let err = store.load(id).expect_err("corrupt");
    assert!(matches!(err, tally_core::CoreError::Serde(_)));
}

#[test]
fn rapid_saves_keep_every_previous_version() {
    let dir = tempdir().expect("tempdir");
    let paths = StoragePaths::under(dir.path());
    let store = JsonCompanyStore::with_retention(paths, 5).expect("create store");
    let mut company = sample_company();
    for name in ["v1", "v2", "v3", "v4"] {
        company.name = name.into();
        store.save(&company).unwrap();
    }

    let backups = store.list_backups(company.id).unwrap();
    assert_eq!(backups.len(), 3);
    let mut names: Vec<_> = backups
        .iter()
        .map(|backup| {
            let data = std::fs::read_to_string(&backup.path).unwrap();
            serde_json::from_str::<Company>(&data).unwrap().name
        })
        .collect();
    names.sort();
    assert_eq!(names, vec!["v1", "v2", "v3"]);
}
