use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::crm::RelationshipStage;
use crate::sync::recipients::Recipient;
use crate::sync::store::{CrmStore, NewContact};

/// Result of resolving a recipient to a contact.
pub struct Resolution {
    pub contact_id: Uuid,
    /// True when this call created the contact.
    pub created: bool,
}

/// Resolves a recipient to an existing contact by email, or creates the
/// contact (and, when needed, its company) on first sighting. Contacts are
/// always created with a company reference and stage Cold. Any store error
/// is a hard error for this recipient; the caller counts it and moves on.
pub async fn resolve_contact(
    store: &dyn CrmStore,
    recipient: &Recipient,
    message_date: NaiveDate,
    user_id: Uuid,
) -> Result<Resolution, sqlx::Error> {
    if let Some(contact_id) = store.find_contact_by_email(&recipient.email).await? {
        return Ok(Resolution {
            contact_id,
            created: false,
        });
    }

    let company_name = company_name_from_email(&recipient.email);
    let company_id = match store.find_company_by_name(user_id, &company_name).await? {
        Some(id) => id,
        None => store.create_company(user_id, &company_name).await?,
    };

    let local_part = recipient.email.split('@').next().unwrap_or("");
    let name = if recipient.name.is_empty() {
        local_part
    } else {
        recipient.name.as_str()
    };

    let contact_id = store
        .create_contact(NewContact {
            user_id,
            name,
            email: &recipient.email,
            company_id,
            stage: RelationshipStage::Cold,
            last_contacted: message_date,
        })
        .await?;

    Ok(Resolution {
        contact_id,
        created: true,
    })
}

/// Derives a placeholder company name from the email domain: `foo` from
/// `jane@foo.com`, or the literal `Unknown` when there is no domain.
pub fn company_name_from_email(email: &str) -> String {
    let domain = email.split('@').nth(1).unwrap_or("");
    let name = domain.split('.').next().unwrap_or("");
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name.to_string()
    }
}
