use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct CodeSession {
    pub session_id: String,
    pub language: String,
    pub code: String,
    pub participants: Vec<String>,
    pub owner: String,
    pub created_at: NaiveDateTime,
}

impl CodeSession {
    pub fn is_participant(&self, user: &str) -> bool {
        self.participants.iter().any(|participant| participant == user)
    }
}
