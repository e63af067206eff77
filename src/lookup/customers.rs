use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::{group_by, index_by, parse_table, DuplicatePolicy};
use crate::error::RowError;
use crate::source::rows::{
    AddressRow, AddressTypeRow, CountryRegionRow, CustomerRow, EmailRow, EntityAddressRow,
    PasswordRow, PersonRow, PhoneRow, StateProvinceRow,
};
use crate::source::{parse_rows, SourceData, SourceTable};

/// Indexes joined on the shared business-entity key.
#[derive(Debug, Default)]
pub struct CustomerLookups {
    /// Individual customers in source order. Store accounts without a
    /// PersonID are dropped here.
    pub customers: Vec<CustomerRow>,
    /// CustomerID → PersonID for the customers above.
    pub customer_persons: HashMap<i64, i64>,
    /// Customer rows that failed to parse. The customer transform reports
    /// them as its own errors.
    pub malformed_customers: Vec<RowError>,
    pub persons: HashMap<i64, PersonRow>,
    pub emails: HashMap<i64, String>,
    pub passwords: HashMap<i64, PasswordRow>,
    pub phones: HashMap<i64, PhoneRow>,
    /// BusinessEntityID → address links.
    pub entity_addresses: HashMap<i64, Vec<EntityAddressRow>>,
    pub addresses: HashMap<i64, AddressRow>,
    pub address_types: HashMap<i64, String>,
    pub states: HashMap<i64, StateProvinceRow>,
    /// CountryRegionCode → name.
    pub countries: HashMap<String, String>,
}

impl CustomerLookups {
    pub fn build(data: &SourceData, rejected: &mut Vec<RowError>) -> Self {
        let (parsed, malformed_customers) = parse_rows::<CustomerRow>(data.rows(SourceTable::Customer));
        let mut customer_persons = HashMap::new();
        let mut customers = Vec::new();
        let mut dropped = 0usize;
        for customer in parsed {
            let Some(person_id) = customer.person_id else {
                dropped += 1;
                continue;
            };
            // first occurrence of a CustomerID wins, for both indexes
            if let Entry::Vacant(slot) = customer_persons.entry(customer.customer_id) {
                slot.insert(person_id);
                customers.push(customer);
            }
        }
        if dropped > 0 {
            tracing::info!(dropped, "Dropped customers without a person record");
        }

        let lookups = Self {
            customers,
            customer_persons,
            malformed_customers,
            persons: index_by(
                parse_table::<PersonRow>(data, rejected),
                DuplicatePolicy::LastWins,
                |p| p.business_entity_id,
                |p| p,
            ),
            emails: index_by(
                parse_table::<EmailRow>(data, rejected),
                DuplicatePolicy::FirstWins,
                |e| e.business_entity_id,
                |e| e.email_address,
            ),
            passwords: index_by(
                parse_table::<PasswordRow>(data, rejected),
                DuplicatePolicy::LastWins,
                |p| p.business_entity_id,
                |p| p,
            ),
            phones: index_by(
                parse_table::<PhoneRow>(data, rejected),
                DuplicatePolicy::FirstWins,
                |p| p.business_entity_id,
                |p| p,
            ),
            entity_addresses: group_by(
                parse_table::<EntityAddressRow>(data, rejected),
                |a| a.business_entity_id,
            ),
            addresses: index_by(
                parse_table::<AddressRow>(data, rejected),
                DuplicatePolicy::LastWins,
                |a| a.address_id,
                |a| a,
            ),
            address_types: index_by(
                parse_table::<AddressTypeRow>(data, rejected),
                DuplicatePolicy::LastWins,
                |t| t.address_type_id,
                |t| t.name,
            ),
            states: index_by(
                parse_table::<StateProvinceRow>(data, rejected),
                DuplicatePolicy::LastWins,
                |s| s.state_province_id,
                |s| s,
            ),
            countries: index_by(
                parse_table::<CountryRegionRow>(data, rejected),
                DuplicatePolicy::LastWins,
                |c| c.code.clone(),
                |c| c.name,
            ),
        };

        tracing::debug!(
            customers = lookups.customers.len(),
            persons = lookups.persons.len(),
            addresses = lookups.addresses.len(),
            "Built customer lookups"
        );

        lookups
    }

    /// Display name of the person behind a customer account.
    pub fn customer_name(&self, customer_id: i64) -> Option<String> {
        self.customer_persons
            .get(&customer_id)
            .and_then(|person_id| self.persons.get(person_id))
            .map(PersonRow::full_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::reader::{parse_pipe, parse_tab};

    fn data() -> SourceData {
        let mut data = SourceData::default();
        data.insert(
            SourceTable::Customer,
            parse_tab(
                "1\t\t934\t1\tAW00000001\tg\t2014-09-12\n\
                 11000\t13531\t\t9\tAW00011000\tg\t2014-09-12\n\
                 11000\t99999\t\t9\tAW00011000\tg\t2014-09-12\n",
            ),
        );
        data.insert(
            SourceTable::Person,
            parse_pipe("13531+|IN+|0+|+|Jon+|V+|Yang+|+|1+|+|+|g+|2011-06-23&|\n"),
        );
        data.insert(
            SourceTable::EmailAddress,
            parse_pipe(
                "13531+|1+|jon24@adventure-works.com+|g+|2011-06-23&|\n\
                 13531+|2+|jon.yang@example.com+|g+|2012-06-23&|\n",
            ),
        );
        data
    }

    #[test]
    fn test_customers_without_person_are_dropped() {
        let mut rejected = Vec::new();
        let lookups = CustomerLookups::build(&data(), &mut rejected);

        assert_eq!(lookups.customers.len(), 1);
        assert_eq!(lookups.customers[0].customer_id, 11000);
        assert_eq!(lookups.customer_persons[&11000], 13531);
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_first_email_wins() {
        let mut rejected = Vec::new();
        let lookups = CustomerLookups::build(&data(), &mut rejected);

        assert_eq!(lookups.emails[&13531], "jon24@adventure-works.com");
        assert_eq!(lookups.customer_name(11000).as_deref(), Some("Jon Yang"));
        assert_eq!(lookups.customer_name(1), None);
    }

    #[test]
    fn test_duplicate_customer_keeps_first_person_everywhere() {
        let mut data = data();
        data.insert(
            SourceTable::Person,
            parse_pipe(
                "13531+|IN+|0+|+|Jon+|V+|Yang+|+|1+|+|+|g+|2011-06-23&|\n\
                 99999+|IN+|0+|+|Eugene+|L+|Huang+|+|0+|+|+|g+|2011-06-23&|\n",
            ),
        );
        let lookups = CustomerLookups::build(&data, &mut Vec::new());

        assert_eq!(lookups.customers[0].person_id, Some(13531));
        assert_eq!(lookups.customer_persons[&11000], 13531);
        assert_eq!(lookups.customer_name(11000).as_deref(), Some("Jon Yang"));
    }

    #[test]
    fn test_malformed_customer_rows_are_kept_for_the_transform() {
        let mut data = data();
        data.insert(
            SourceTable::Customer,
            parse_tab(
                "11000\t13531\t\t9\tAW00011000\tg\t2014-09-12\n\
                 x11002\t13532\t\t9\tAW00011002\tg\t2014-09-12\n\
                 11003\t13533\n",
            ),
        );
        let mut rejected = Vec::new();
        let lookups = CustomerLookups::build(&data, &mut rejected);

        assert!(rejected.is_empty());
        assert_eq!(lookups.customers.len(), 1);
        assert_eq!(lookups.malformed_customers.len(), 2);
        assert_eq!(lookups.malformed_customers[0].table(), SourceTable::Customer);
    }
}
