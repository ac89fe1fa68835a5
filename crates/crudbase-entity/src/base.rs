//! Soft-delete flag and audit columns shared by every table.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crudbase_core::result::AppResult;
use crudbase_core::types::{DEL_FLAG_COLUMN, DeleteFlag, Record, UPDATE_TIME_COLUMN};

use crate::meta::{ColumnDef, ColumnType};

/// Column holding the creating user.
pub const CREATE_USER_COLUMN: &str = "create_user";
/// Column holding the creation time.
pub const CREATE_TIME_COLUMN: &str = "create_time";
/// Column holding the last updating user.
pub const UPDATE_USER_COLUMN: &str = "update_user";

/// Columns every entity table carries in addition to its own.
pub static BASE_COLUMNS: [ColumnDef; 5] = [
    ColumnDef::new(DEL_FLAG_COLUMN, ColumnType::Text),
    ColumnDef::new(CREATE_USER_COLUMN, ColumnType::Text),
    ColumnDef::new(CREATE_TIME_COLUMN, ColumnType::Timestamp),
    ColumnDef::new(UPDATE_USER_COLUMN, ColumnType::Text),
    ColumnDef::new(UPDATE_TIME_COLUMN, ColumnType::Timestamp),
];

/// Audit and soft-delete fields embedded in every entity.
///
/// Every field is optional so that selective writes can leave a column
/// untouched. `update_last_time` is not a column: it carries the
/// `update_time` the caller last observed and guards exclusive updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseFields {
    #[serde(default)]
    pub del_flag: Option<DeleteFlag>,
    #[serde(default)]
    pub create_user: Option<String>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_user: Option<String>,
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_last_time: Option<DateTime<Utc>>,
}

impl BaseFields {
    /// Fields of a freshly created live row.
    pub fn created(user: impl Into<String>, now: DateTime<Utc>) -> Self {
        let user = user.into();
        let now = now.trunc_subsecs(3);
        Self {
            del_flag: Some(DeleteFlag::Exist),
            create_user: Some(user.clone()),
            create_time: Some(now),
            update_user: Some(user),
            update_time: Some(now),
            update_last_time: None,
        }
    }

    /// Record who changed the row and when.
    pub fn touched(&mut self, user: impl Into<String>, now: DateTime<Utc>) {
        self.update_user = Some(user.into());
        self.update_time = Some(now.trunc_subsecs(3));
    }

    pub fn is_deleted(&self) -> bool {
        self.del_flag == Some(DeleteFlag::Deleted)
    }

    /// Write the audit columns into a record.
    pub fn write_to(&self, record: &mut Record) {
        record.set(DEL_FLAG_COLUMN, self.del_flag);
        record.set(CREATE_USER_COLUMN, self.create_user.clone());
        record.set(CREATE_TIME_COLUMN, self.create_time);
        record.set(UPDATE_USER_COLUMN, self.update_user.clone());
        record.set(UPDATE_TIME_COLUMN, self.update_time);
    }

    /// Take the audit columns out of a record.
    pub fn read_from(record: &mut Record) -> AppResult<Self> {
        let del_flag = record
            .take_string(DEL_FLAG_COLUMN)?
            .map(|code| DeleteFlag::from_code(&code))
            .transpose()?;
        Ok(Self {
            del_flag,
            create_user: record.take_string(CREATE_USER_COLUMN)?,
            create_time: record.take_timestamp(CREATE_TIME_COLUMN)?,
            update_user: record.take_string(UPDATE_USER_COLUMN)?,
            update_time: record.take_timestamp(UPDATE_TIME_COLUMN)?,
            update_last_time: None,
        })
    }
}
