use hospital_core::db::migrations::latest_version;
use hospital_core::db::open_db_in_memory;
use hospital_core::{
    DeletePolicy, Doctor, DoctorRepository, EntityKind, LookupKey, Patient, PatientRepository,
    RepoError, SqliteDoctorRepository, SqliteHospitalService, SqlitePatientRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn add_patient_then_list_includes_exact_fields_and_fresh_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePatientRepository::try_new(&conn).unwrap();

    let id = repo.add_patient("Alice", 30, "123 St").unwrap();

    let patients = repo.list_patients().unwrap();
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0], Patient::with_id(id, "Alice", 30, "123 St"));
    assert!(!id.is_nil());
}

#[test]
fn list_patients_keeps_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePatientRepository::try_new(&conn).unwrap();

    let names = ["Zoe", "Adam", "Mia", "Bob"];
    let ids: Vec<_> = names
        .iter()
        .map(|name| repo.add_patient(name, 40, "somewhere").unwrap())
        .collect();

    let listed: Vec<_> = repo
        .list_patients()
        .unwrap()
        .into_iter()
        .map(|patient| patient.id)
        .collect();
    assert_eq!(listed, ids);
}

#[test]
fn list_patients_on_empty_store_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePatientRepository::try_new(&conn).unwrap();
    assert!(repo.list_patients().unwrap().is_empty());
}

#[test]
fn add_doctor_twice_creates_two_rows_with_distinct_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDoctorRepository::try_new(&conn).unwrap();

    let first = repo.add_doctor("Lee", "Neurology").unwrap();
    let second = repo.add_doctor("Lee", "Neurology").unwrap();

    assert_ne!(first, second);
    let doctors = repo.list_doctors().unwrap();
    assert_eq!(doctors.len(), 2);
    assert_eq!(doctors[0].id, first);
    assert_eq!(doctors[1].id, second);
}

#[test]
fn specialization_filter_is_exact_and_case_sensitive() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDoctorRepository::try_new(&conn).unwrap();

    let smith = repo.add_doctor("Smith", "Cardiology").unwrap();
    repo.add_doctor("Jones", "cardiology").unwrap();
    repo.add_doctor("Brown", "Cardiology ").unwrap();
    let lee = repo.add_doctor("Lee", "Cardiology").unwrap();
    repo.add_doctor("Kim", "Neurology").unwrap();

    let ids: Vec<_> = repo
        .list_doctors_by_specialization("Cardiology")
        .unwrap()
        .into_iter()
        .map(|doctor| doctor.id)
        .collect();
    assert_eq!(ids, vec![smith, lee]);

    assert!(repo
        .list_doctors_by_specialization("Dermatology")
        .unwrap()
        .is_empty());
}

#[test]
fn empty_specialization_matches_only_empty_specializations() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDoctorRepository::try_new(&conn).unwrap();

    repo.add_doctor("Smith", "Cardiology").unwrap();
    let generalist = repo.add_doctor("Doe", "").unwrap();

    let doctors = repo.list_doctors_by_specialization("").unwrap();
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].id, generalist);
}

#[test]
fn get_by_id_returns_not_found_for_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let patients = SqlitePatientRepository::try_new(&conn).unwrap();
    let doctors = SqliteDoctorRepository::try_new(&conn).unwrap();
    let missing = Uuid::new_v4();

    let err = patients.get_patient(missing).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::Patient,
            key: LookupKey::Id(id),
        } if id == missing
    ));

    let err = doctors.get_doctor(missing).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::Doctor,
            ..
        }
    ));
}

#[test]
fn find_by_name_reports_not_found_and_ambiguous() {
    let conn = open_db_in_memory().unwrap();
    let service = SqliteHospitalService::try_from_connection(&conn).unwrap();

    let alice = service.add_patient("Alice", 30, "123 St").unwrap();
    service.add_doctor("Lee", "Neurology").unwrap();
    service.add_doctor("Lee", "Oncology").unwrap();

    assert_eq!(service.find_patient_by_name("Alice").unwrap().id, alice);

    let err = service.find_patient_by_name("alice").unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::Patient,
            key: LookupKey::Name(ref name),
        } if name == "alice"
    ));

    let err = service.find_doctor_by_name("Lee").unwrap_err();
    assert!(matches!(
        err,
        RepoError::Ambiguous {
            entity: EntityKind::Doctor,
            matches: 2,
            ..
        }
    ));
}

#[test]
fn replace_overwrites_all_fields_and_rejects_unknown_ids() {
    let conn = open_db_in_memory().unwrap();
    let patients = SqlitePatientRepository::try_new(&conn).unwrap();
    let doctors = SqliteDoctorRepository::try_new(&conn).unwrap();

    let patient_id = patients.add_patient("Alice", 30, "123 St").unwrap();
    let replacement = Patient::with_id(patient_id, "Alice B.", 31, "9 Elm Rd");
    patients.replace_patient(&replacement).unwrap();
    assert_eq!(patients.get_patient(patient_id).unwrap(), replacement);

    let doctor_id = doctors.add_doctor("Smith", "Cardiology").unwrap();
    let replacement = Doctor::with_id(doctor_id, "Smith", "Surgery");
    doctors.replace_doctor(&replacement).unwrap();
    assert_eq!(doctors.get_doctor(doctor_id).unwrap(), replacement);

    let unknown = Patient::new("Ghost", 1, "nowhere");
    let err = patients.replace_patient(&unknown).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { .. }));
    assert_eq!(patients.list_patients().unwrap().len(), 1);
}

#[test]
fn delete_missing_id_is_a_successful_no_op() {
    let conn = open_db_in_memory().unwrap();
    let patients = SqlitePatientRepository::try_new(&conn).unwrap();
    let doctors = SqliteDoctorRepository::try_new(&conn).unwrap();
    patients.add_patient("Alice", 30, "123 St").unwrap();
    doctors.add_doctor("Smith", "Cardiology").unwrap();
    let before_patients = patients.list_patients().unwrap();
    let before_doctors = doctors.list_doctors().unwrap();

    let outcome = patients
        .delete_patient(Uuid::new_v4(), DeletePolicy::Restrict)
        .unwrap();
    assert!(!outcome.removed);
    assert_eq!(outcome.cascaded_appointments, 0);

    let outcome = doctors
        .delete_doctor(Uuid::new_v4(), DeletePolicy::Cascade)
        .unwrap();
    assert!(!outcome.removed);

    assert_eq!(patients.list_patients().unwrap(), before_patients);
    assert_eq!(doctors.list_doctors().unwrap(), before_doctors);
}

#[test]
fn delete_unreferenced_rows() {
    let conn = open_db_in_memory().unwrap();
    let patients = SqlitePatientRepository::try_new(&conn).unwrap();

    let keep = patients.add_patient("Alice", 30, "123 St").unwrap();
    let drop_id = patients.add_patient("Bob", 50, "1 Main").unwrap();

    let outcome = patients
        .delete_patient(drop_id, DeletePolicy::Restrict)
        .unwrap();
    assert!(outcome.removed);

    let remaining = patients.list_patients().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep);
}

#[test]
fn add_patient_store_failure_is_surfaced_and_leaves_no_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePatientRepository::try_new(&conn).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER block_patients BEFORE INSERT ON patients
         BEGIN
            SELECT RAISE(ABORT, 'insert blocked');
         END;",
    )
    .unwrap();

    let err = repo.add_patient("Alice", 30, "123 St").unwrap_err();
    assert!(err.is_store_unavailable());
    assert!(conn.is_autocommit());
    assert!(repo.list_patients().unwrap().is_empty());
}

#[test]
fn write_while_caller_holds_a_transaction_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDoctorRepository::try_new(&conn).unwrap();

    conn.execute_batch("BEGIN;").unwrap();
    let err = repo.add_doctor("Smith", "Cardiology").unwrap_err();
    assert!(err.is_store_unavailable());
    conn.execute_batch("ROLLBACK;").unwrap();

    assert!(repo.list_doctors().unwrap().is_empty());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqlitePatientRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteDoctorRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("doctors"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE patients (
            uuid TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            age INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqlitePatientRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "patients",
            column: "address"
        })
    ));
}
