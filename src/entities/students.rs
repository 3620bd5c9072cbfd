use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Roll number, uppercased at write time. Immutable once assigned.
    #[sea_orm(primary_key, auto_increment = false)]
    pub roll: String,

    pub name: String,

    pub branch: String,

    pub dob: Date,

    /// Validity window in the legacy "<start>-<end>" encoding.
    /// Validated at write time; see `models::ValidityWindow`.
    pub issue_valid: String,

    /// Argon2id hash of the 4-digit PIN. The PIN itself is never stored.
    pub pin_hash: String,

    pub photo_url: String,

    /// Deletable handle at the photo store.
    pub photo_handle: String,

    /// Date the credential was issued; target of the lastYears filter.
    pub issued_at: Date,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attendance_records::Entity")]
    AttendanceRecords,
}

impl Related<super::attendance_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
