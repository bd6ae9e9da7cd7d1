use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::group_members)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GroupMember {
    pub id: i32,
    pub group_name: String,
    pub member: String,
    pub joined_at: NaiveDateTime,
}
