use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{SantaError, SantaResult};

pub type GroupId = String;

/// Giver email to recipient display name.
pub type Assignments = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub email: String,
    pub name: String,
}

/// Who is making a request, as vouched for by the authentication layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub name: String,
}

impl Identity {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }

    /// Trimmed copy of this identity, rejecting blank fields.
    pub fn validated(&self) -> SantaResult<Identity> {
        Ok(Identity {
            email: non_blank(&self.email, "email")?,
            name: non_blank(&self.name, "name")?,
        })
    }

    pub fn as_member(&self) -> Member {
        Member {
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Open,
    Generated,
}

/// Validated input for creating a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDraft {
    name: String,
    organizer: Identity,
}

impl GroupDraft {
    pub fn new(name: &str, organizer: &Identity) -> SantaResult<Self> {
        Ok(Self {
            name: non_blank(name, "group name")?,
            organizer: organizer.validated()?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn organizer(&self) -> &Identity {
        &self.organizer
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub organizer_email: String,
    pub organizer_name: String,
    pub members: Vec<Member>,
    pub member_emails: BTreeSet<String>,
    #[serde(default)]
    pub assignments: Assignments,
    pub status: GroupStatus,
    pub created_at: u64,
}

impl Group {
    /// Opens a new group with the organizer as its only member.
    pub fn from_draft(id: impl Into<GroupId>, draft: GroupDraft, created_at: u64) -> Self {
        let organizer = draft.organizer.as_member();
        Self {
            id: id.into(),
            name: draft.name,
            organizer_email: organizer.email.clone(),
            organizer_name: organizer.name.clone(),
            member_emails: BTreeSet::from([organizer.email.clone()]),
            members: vec![organizer],
            assignments: Assignments::new(),
            status: GroupStatus::Open,
            created_at,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, GroupStatus::Open)
    }

    pub fn has_member(&self, email: &str) -> bool {
        self.member_emails.contains(email)
    }

    pub fn is_organizer(&self, email: &str) -> bool {
        self.organizer_email == email
    }

    /// Appends `member` unless the email is already present. Returns whether
    /// the roster changed.
    pub fn add_member(&mut self, member: Member) -> bool {
        if !self.member_emails.insert(member.email.clone()) {
            return false;
        }
        self.members.push(member);
        true
    }
}

fn non_blank(value: &str, field: &'static str) -> SantaResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(SantaError::invalid(field, "cannot be blank"))
    } else {
        Ok(trimmed.to_string())
    }
}
