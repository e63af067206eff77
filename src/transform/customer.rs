use crate::lookup::CustomerLookups;
use crate::source::rows::CustomerRow;
use crate::storage::models::{AddressSnapshot, Aggregate, CustomerDocument};
use crate::transform::address::address_snapshot;
use crate::transform::values::normalize_date;
use crate::transform::TransformOutput;

/// Build customer documents from the filtered customer lookup. Person data is
/// merged from Person, EmailAddress, Password, PersonPhone and the
/// business-entity address links, all keyed by PersonID.
pub fn transform_customers(lookups: &CustomerLookups) -> TransformOutput<CustomerDocument> {
    let mut output = TransformOutput::default();
    for error in &lookups.malformed_customers {
        output.push_error(Aggregate::Customer, error.clone());
    }
    for customer in &lookups.customers {
        output.documents.push(customer_document(customer, lookups));
    }
    output
}

fn customer_document(customer: &CustomerRow, lookups: &CustomerLookups) -> CustomerDocument {
    let customer_id = customer.customer_id.to_string();
    let entity_id = customer.person_id;

    let person = entity_id.and_then(|id| lookups.persons.get(&id));
    let password = entity_id.and_then(|id| lookups.passwords.get(&id));

    CustomerDocument {
        id: customer_id.clone(),
        customer_id,
        account_number: customer.account_number.clone(),
        person_type: person.map(|p| p.person_type.clone()),
        title: person.and_then(|p| p.title.clone()),
        first_name: person.map(|p| p.first_name.clone()),
        middle_name: person.and_then(|p| p.middle_name.clone()),
        last_name: person.map(|p| p.last_name.clone()),
        suffix: person.and_then(|p| p.suffix.clone()),
        email_address: entity_id.and_then(|id| lookups.emails.get(&id).cloned()),
        email_promotion: person.and_then(|p| p.email_promotion.parse().ok()),
        phone_number: entity_id
            .and_then(|id| lookups.phones.get(&id))
            .map(|p| p.phone_number.clone()),
        password_hash: password.map(|p| p.password_hash.clone()),
        password_salt: password.map(|p| p.password_salt.clone()),
        addresses: entity_id
            .map(|id| addresses(id, lookups))
            .unwrap_or_default(),
        modified_date: normalize_date(&customer.modified_date),
    }
}

fn addresses(business_entity_id: i64, lookups: &CustomerLookups) -> Vec<AddressSnapshot> {
    let Some(links) = lookups.entity_addresses.get(&business_entity_id) else {
        return Vec::new();
    };

    links
        .iter()
        .filter_map(|link| {
            let address_type = lookups.address_types.get(&link.address_type_id).cloned();
            let snapshot = address_snapshot(lookups, link.address_id, address_type);
            if snapshot.is_none() {
                tracing::debug!(
                    business_entity_id,
                    address_id = link.address_id,
                    "Address link points at a missing address"
                );
            }
            snapshot
        })
        .collect()
}
