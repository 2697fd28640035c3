/// Tables, indexes, and reference rows. Every statement is idempotent so the migration can run on
/// each startup.
pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS roles (
    role_id INTEGER PRIMARY KEY AUTOINCREMENT,
    role_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS staff (
    staff_id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    employee_number TEXT NOT NULL UNIQUE,
    role_id INTEGER NOT NULL REFERENCES roles(role_id),
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS tasks (
    task_id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS staff_tasks (
    staff_id INTEGER NOT NULL REFERENCES staff(staff_id),
    task_id INTEGER NOT NULL REFERENCES tasks(task_id),
    PRIMARY KEY (staff_id, task_id)
);

CREATE TABLE IF NOT EXISTS donors (
    donor_id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    date_of_birth TEXT NOT NULL,
    gender TEXT NOT NULL,
    blood_group TEXT NOT NULL CHECK (blood_group IN ('A', 'B', 'AB', 'O')),
    rh_factor TEXT NOT NULL CHECK (rh_factor IN ('+', '-')),
    phone_number TEXT,
    email TEXT
);

CREATE INDEX IF NOT EXISTS idx_donors_last_name ON donors (last_name);

CREATE TABLE IF NOT EXISTS screenings (
    screening_id TEXT PRIMARY KEY,
    donor_id TEXT NOT NULL REFERENCES donors(donor_id),
    staff_id INTEGER NOT NULL REFERENCES staff(staff_id),
    screening_date TEXT NOT NULL,
    hemoglobin REAL NOT NULL,
    blood_pressure_systolic INTEGER NOT NULL,
    blood_pressure_diastolic INTEGER NOT NULL,
    weight_kg REAL NOT NULL,
    is_eligible INTEGER NOT NULL,
    notes TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_screenings_donor_date ON screenings (donor_id, screening_date);

CREATE TABLE IF NOT EXISTS donations (
    donation_id TEXT PRIMARY KEY,
    donor_id TEXT NOT NULL REFERENCES donors(donor_id),
    screening_id TEXT NOT NULL UNIQUE REFERENCES screenings(screening_id),
    phlebotomist_staff_id INTEGER NOT NULL REFERENCES staff(staff_id),
    donation_date TEXT NOT NULL,
    collection_site TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS organization (
    org_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    org_type TEXT NOT NULL,
    contact_person TEXT,
    contact_phone TEXT,
    contact_email TEXT
);

CREATE TABLE IF NOT EXISTS blood_units (
    unit_id TEXT PRIMARY KEY,
    donation_id TEXT NOT NULL UNIQUE REFERENCES donations(donation_id),
    blood_group TEXT NOT NULL CHECK (blood_group IN ('A', 'B', 'AB', 'O')),
    rh_factor TEXT NOT NULL CHECK (rh_factor IN ('+', '-')),
    collection_date TEXT NOT NULL,
    expiry_date TEXT NOT NULL,
    status TEXT NOT NULL,
    issued_to_org_id INTEGER REFERENCES organization(org_id)
);

CREATE INDEX IF NOT EXISTS idx_blood_units_status ON blood_units (status);

CREATE TABLE IF NOT EXISTS blood_requests (
    request_id INTEGER PRIMARY KEY AUTOINCREMENT,
    org_id INTEGER NOT NULL REFERENCES organization(org_id),
    patient_name TEXT,
    blood_group TEXT NOT NULL CHECK (blood_group IN ('A', 'B', 'AB', 'O')),
    rh_factor TEXT NOT NULL CHECK (rh_factor IN ('+', '-')),
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    status TEXT NOT NULL,
    request_date TEXT NOT NULL
);

INSERT OR IGNORE INTO roles (role_name) VALUES
    ('Phlebotomist'),
    ('Nurse'),
    ('Lab Technician'),
    ('Administrator');

INSERT OR IGNORE INTO tasks (task_name) VALUES
    ('Donor Screening'),
    ('Blood Collection'),
    ('Inventory Management'),
    ('Unit Issuing');
"#;
