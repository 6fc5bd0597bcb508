// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! SQLite schema.

/// Table and index definitions, safe to run on every open.
pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS procurements (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  fz_number INTEGER NOT NULL,
  uin TEXT NOT NULL,
  object_of TEXT NOT NULL,
  publisher_name TEXT NOT NULL,
  contract_price TEXT,
  procedure_type TEXT NOT NULL,
  stage TEXT,
  link_on_placement TEXT,
  application_deadline TEXT,
  application_secure TEXT,
  contract_secure TEXT,
  restrictions TEXT,
  last_updated_from_eis TEXT,
  date_of_placement TEXT,
  date_of_auction TEXT,
  time_of_auction TEXT,
  time_zone TEXT,
  etp_name TEXT,
  etp_url TEXT,
  summing_up_date TEXT,
  created_at_us INTEGER
);

CREATE INDEX IF NOT EXISTS idx_procurements_fz ON procurements(fz_number);
CREATE INDEX IF NOT EXISTS idx_procurements_key ON procurements(uin, fz_number);
CREATE INDEX IF NOT EXISTS idx_procurements_created ON procurements(created_at_us);

CREATE TABLE IF NOT EXISTS users (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  user_name TEXT NOT NULL UNIQUE,
  email TEXT NOT NULL,
  password_hash TEXT NOT NULL,
  roles TEXT NOT NULL,
  status TEXT NOT NULL,
  created_at_us INTEGER
);
"#;

/// Data columns in bind order. `id` is not included.
pub const DATA_COLUMNS: [&str; 21] = [
    "fz_number",
    "uin",
    "object_of",
    "publisher_name",
    "contract_price",
    "procedure_type",
    "stage",
    "link_on_placement",
    "application_deadline",
    "application_secure",
    "contract_secure",
    "restrictions",
    "last_updated_from_eis",
    "date_of_placement",
    "date_of_auction",
    "time_of_auction",
    "time_zone",
    "etp_name",
    "etp_url",
    "summing_up_date",
    "created_at_us",
];

/// Column list for `SELECT`, in decode order.
pub fn select_list() -> String {
    format!("id, {}", DATA_COLUMNS.join(", "))
}

/// Name of the column at a `SELECT` index.
pub fn column_name(index: usize) -> &'static str {
    match index {
        0 => "id",
        n => DATA_COLUMNS.get(n - 1).copied().unwrap_or("?"),
    }
}

/// `INSERT` statement binding every data column.
pub fn insert_sql() -> String {
    let placeholders: Vec<String> = (1..=DATA_COLUMNS.len()).map(|n| format!("?{n}")).collect();
    format!(
        "INSERT INTO procurements ({}) VALUES ({})",
        DATA_COLUMNS.join(", "),
        placeholders.join(", ")
    )
}

/// `UPDATE` statement binding every data column, then the id.
///
/// A `NULL` creation instant keeps the stored one.
pub fn update_sql() -> String {
    let assignments: Vec<String> = DATA_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, col)| match *col {
            "created_at_us" => format!("{col} = COALESCE(?{}, {col})", i + 1),
            _ => format!("{col} = ?{}", i + 1),
        })
        .collect();
    format!(
        "UPDATE procurements SET {} WHERE id = ?{}",
        assignments.join(", "),
        DATA_COLUMNS.len() + 1
    )
}
