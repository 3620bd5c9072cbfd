use sea_orm::entity::prelude::*;

/// One row per student per calendar day. The composite primary key is the
/// storage-level guard against the check-then-insert race on marking.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub roll: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub date: Date,

    /// "Present" or "Absent". Never overwritten once set.
    pub status: String,

    /// Wall-clock time of a present scan; absent rows have none.
    pub time: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::Roll",
        to = "super::students::Column::Roll",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Students,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
