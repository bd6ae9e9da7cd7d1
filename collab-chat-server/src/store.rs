use crate::errors::store_error::StoreError;
use crate::models::group_member::GroupMember;
use crate::models::message::{HistoryQuery, Message, NewMessage};
use crate::models::shared_file::{NewSharedFile, SharedFile, SharedFileInfo};
use crate::schema::{group_members, groups, messages, shared_files};
use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::dsl::exists;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{
    BoolExpressionMethods, Connection, ExpressionMethods, OptionalExtension, QueryDsl,
    RunQueryDsl, SelectableHelper, SqliteConnection, insert_into, insert_or_ignore_into, select,
};
use log::debug;

const SCHEMA: &str = include_str!("../migrations/2025-06-01-000000_create_chat_tables/up.sql");

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, connection: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        connection
            .batch_execute(
                "PRAGMA busy_timeout = 5000; PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;",
            )
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Durable messages, groups and shared files
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Opens the database, creating the tables when they do not exist yet
    pub fn open(database_url: &str, pool_size: u32) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .test_on_check_out(true)
            .connection_customizer(Box::new(ConnectionOptions))
            .build(manager)
            .map_err(|error| StoreError::PoolBuild(error.to_string()))?;

        let store = Store { pool };
        store.connection()?.batch_execute(SCHEMA)?;
        debug!("Store ready at {database_url}");
        Ok(store)
    }

    fn connection(
        &self,
    ) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>, StoreError> {
        Ok(self.pool.get()?)
    }

    pub fn save_message(&self, message: &NewMessage) -> Result<(), StoreError> {
        let connection = &mut self.connection()?;
        insert_message(connection, message, chrono::Utc::now().naive_utc())?;
        Ok(())
    }

    /// The newest `limit` messages matching `query`, oldest first
    pub fn messages(&self, query: &HistoryQuery, limit: i64) -> Result<Vec<Message>, StoreError> {
        let connection = &mut self.connection()?;

        let mut statement = messages::table
            .filter(messages::kind.eq(query.kind().as_str()))
            .into_boxed();

        match query {
            HistoryQuery::Broadcast => (),
            HistoryQuery::Personal { user, peer } => {
                statement = statement.filter(
                    messages::sender
                        .eq(user)
                        .and(messages::recipient.eq(peer))
                        .or(messages::sender.eq(peer).and(messages::recipient.eq(user))),
                );
            }
            HistoryQuery::Group(group) => {
                statement = statement.filter(messages::group_name.eq(group));
            }
        }

        let mut history = statement
            .order(messages::id.desc())
            .limit(limit)
            .select(Message::as_select())
            .load(connection)?;

        history.reverse();
        Ok(history)
    }

    /// Creates a group with its creator and `members` in one transaction
    pub fn create_group(
        &self,
        name: &str,
        creator: &str,
        members: &[String],
    ) -> Result<(), StoreError> {
        let connection = &mut self.connection()?;
        let now = chrono::Utc::now().naive_utc();

        let result = connection.transaction::<_, DieselError, _>(|connection| {
            insert_into(groups::table)
                .values((
                    groups::name.eq(name),
                    groups::creator.eq(creator),
                    groups::created_at.eq(now),
                ))
                .execute(connection)?;

            for member in std::iter::once(creator).chain(members.iter().map(String::as_str)) {
                insert_or_ignore_into(group_members::table)
                    .values((
                        group_members::group_name.eq(name),
                        group_members::member.eq(member),
                        group_members::joined_at.eq(now),
                    ))
                    .execute(connection)?;
            }

            Ok(())
        });

        match result {
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(StoreError::GroupExists(name.to_string()))
            }
            result => Ok(result?),
        }
    }

    pub fn group_exists(&self, group: &str) -> Result<bool, StoreError> {
        let connection = &mut self.connection()?;
        Ok(select(exists(groups::table.filter(groups::name.eq(group)))).get_result(connection)?)
    }

    pub fn is_member(&self, group: &str, member: &str) -> Result<bool, StoreError> {
        let connection = &mut self.connection()?;
        Ok(select(exists(
            group_members::table
                .filter(group_members::group_name.eq(group))
                .filter(group_members::member.eq(member)),
        ))
        .get_result(connection)?)
    }

    /// Members of `group` in the order they were added
    pub fn group_members(&self, group: &str) -> Result<Vec<String>, StoreError> {
        let connection = &mut self.connection()?;

        let members = group_members::table
            .filter(group_members::group_name.eq(group))
            .order(group_members::id.asc())
            .select(GroupMember::as_select())
            .load(connection)?;

        Ok(members.into_iter().map(|member| member.member).collect())
    }

    pub fn user_groups(&self, user: &str) -> Result<Vec<String>, StoreError> {
        let connection = &mut self.connection()?;

        Ok(group_members::table
            .filter(group_members::member.eq(user))
            .order(group_members::group_name.asc())
            .select(group_members::group_name)
            .load(connection)?)
    }

    /// Stores `file` and the chat message announcing it, both or neither.
    /// The message's `file_ref` is set to the file id.
    pub fn share_file(
        &self,
        file: &NewSharedFile,
        message: NewMessage,
    ) -> Result<SharedFileInfo, StoreError> {
        let connection = &mut self.connection()?;
        let now = chrono::Utc::now().naive_utc();
        let size = file.content.len() as i64;

        connection.transaction::<_, DieselError, _>(|connection| {
            insert_message(connection, &message.with_file(file.file_id), now)?;

            insert_into(shared_files::table)
                .values((
                    shared_files::file_id.eq(file.file_id),
                    shared_files::filename.eq(file.filename),
                    shared_files::content.eq(file.content),
                    shared_files::size.eq(size),
                    shared_files::mime_type.eq(file.mime_type),
                    shared_files::sender.eq(file.sender),
                    shared_files::recipient.eq(file.recipient),
                    shared_files::group_name.eq(file.group_name),
                    shared_files::timestamp.eq(now),
                ))
                .execute(connection)?;

            Ok(())
        })?;

        Ok(SharedFileInfo {
            file_id: file.file_id.to_string(),
            filename: file.filename.to_string(),
            size,
            mime_type: file.mime_type.to_string(),
            sender: file.sender.to_string(),
            recipient: file.recipient.map(str::to_string),
            group_name: file.group_name.map(str::to_string),
            timestamp: now,
        })
    }

    pub fn file(&self, file_id: &str) -> Result<Option<SharedFile>, StoreError> {
        let connection = &mut self.connection()?;

        Ok(shared_files::table
            .filter(shared_files::file_id.eq(file_id))
            .select(SharedFile::as_select())
            .first(connection)
            .optional()?)
    }

    /// Files `user` sent, received, can see through a group, or that were shared with everyone.
    /// Newest first.
    pub fn files_visible_to(&self, user: &str) -> Result<Vec<SharedFileInfo>, StoreError> {
        let user_groups = self.user_groups(user)?;
        let connection = &mut self.connection()?;

        Ok(shared_files::table
            .filter(
                shared_files::sender
                    .eq(user)
                    .or(shared_files::recipient.eq(user))
                    .or(shared_files::group_name.eq_any(user_groups))
                    .or(shared_files::recipient
                        .is_null()
                        .and(shared_files::group_name.is_null())),
            )
            .order((shared_files::timestamp.desc(), shared_files::id.desc()))
            .select(SharedFileInfo::as_select())
            .load(connection)?)
    }

    /// Deletes a file on behalf of its sender, returning whether anything was removed
    pub fn delete_file(&self, file_id: &str, requester: &str) -> Result<bool, StoreError> {
        let connection = &mut self.connection()?;

        let deleted = diesel::delete(
            shared_files::table
                .filter(shared_files::file_id.eq(file_id))
                .filter(shared_files::sender.eq(requester)),
        )
        .execute(connection)?;

        Ok(deleted > 0)
    }
}

fn insert_message(
    connection: &mut SqliteConnection,
    message: &NewMessage,
    timestamp: NaiveDateTime,
) -> Result<usize, DieselError> {
    insert_into(messages::table)
        .values((
            messages::sender.eq(message.sender),
            messages::recipient.eq(message.recipient),
            messages::group_name.eq(message.group_name),
            messages::content.eq(message.content),
            messages::kind.eq(message.kind.as_str()),
            messages::timestamp.eq(timestamp),
            messages::file_ref.eq(message.file_ref),
        ))
        .execute(connection)
}
