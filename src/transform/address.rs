use crate::lookup::CustomerLookups;
use crate::storage::models::AddressSnapshot;

/// Resolve an address id into a snapshot, joining state and country names.
/// The country name falls back to the raw code when it is not in the lookup.
pub fn address_snapshot(
    lookups: &CustomerLookups,
    address_id: i64,
    address_type: Option<String>,
) -> Option<AddressSnapshot> {
    let address = lookups.addresses.get(&address_id)?;
    let state = address
        .state_province_id
        .and_then(|id| lookups.states.get(&id));

    let country_code = state.map(|s| s.country_region_code.clone());
    let country_name = country_code
        .as_ref()
        .map(|code| lookups.countries.get(code).cloned().unwrap_or_else(|| code.clone()));

    Some(AddressSnapshot {
        address_type,
        address_line1: address.address_line1.clone(),
        address_line2: address.address_line2.clone(),
        city: address.city.clone(),
        state_province: state.map(|s| s.name.clone()),
        state_province_code: state.map(|s| s.code.clone()),
        country_region: country_name,
        country_region_code: country_code,
        postal_code: address.postal_code.clone(),
    })
}
