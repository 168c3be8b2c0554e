/// CRM domain enums stored as their display strings in Postgres.
/// The check constraints in migrations/0001_init.sql mirror these variants.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipStage {
    Cold,
    Warm,
    Active,
}

impl RelationshipStage {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipStage::Cold => "Cold",
            RelationshipStage::Warm => "Warm",
            RelationshipStage::Active => "Active",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Email,
    LinkedIn,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Email => "Email",
            Channel::LinkedIn => "LinkedIn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Sent => "sent",
            Direction::Received => "received",
        }
    }
}
