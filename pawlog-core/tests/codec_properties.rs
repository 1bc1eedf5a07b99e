//! Property-based tests for the wire codec.
//!
//! - Round trip: from_wire(to_wire(x)) == x, with timestamps truncated to milliseconds
//! - Naming: snake_to_camel and camel_to_snake invert each other on identifiers
//! - Unknown keys carried in `extra` survive both directions

use chrono::{DateTime, NaiveDate, SubsecRound, TimeZone, Utc};
use pawlog_core::codec::{camel_to_snake, snake_to_camel};
use pawlog_core::models::{
    Address, Attachment, HealthRecord, HealthRecordType, Meal, MealItem, MealType, Pet,
    ProviderInfo, Species, VetContact,
};
use pawlog_core::{from_wire, to_wire, Entity};
use proptest::prelude::*;
use serde_json::{Map, Value};

// =============================================================================
// STRATEGIES
// =============================================================================

fn text() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 .,'-]{0,24}").unwrap()
}

fn opt_text() -> impl Strategy<Value = Option<String>> {
    prop::option::of(text())
}

/// Any instant from 1970 to 2100, nanosecond precision.
fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800, 0u32..1_000_000_000)
        .prop_map(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).unwrap())
}

/// Hundredths, so the value survives nested JSON text exactly.
fn amount(max: u32) -> impl Strategy<Value = f64> {
    (0..max * 100).prop_map(|n| f64::from(n) / 100.0)
}

fn date() -> impl Strategy<Value = NaiveDate> {
    (1990i32..2040, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// Keys no entity models, so they land in `extra`.
fn extra() -> impl Strategy<Value = Map<String, Value>> {
    let value = prop_oneof![
        text().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ];
    prop::collection::btree_map(
        prop::string::string_regex("x_[a-z]{1,8}").unwrap(),
        value,
        0..4,
    )
    .prop_map(|entries| entries.into_iter().collect())
}

fn species() -> impl Strategy<Value = Species> {
    prop::sample::select(vec![
        Species::Dog,
        Species::Cat,
        Species::Bird,
        Species::Rabbit,
        Species::Reptile,
        Species::Fish,
        Species::Other,
    ])
}

fn address() -> impl Strategy<Value = Address> {
    (text(), text(), opt_text(), opt_text()).prop_map(|(street, city, postal_code, country)| {
        Address {
            street,
            city,
            postal_code,
            country,
        }
    })
}

fn vet() -> impl Strategy<Value = VetContact> {
    (text(), opt_text(), opt_text(), prop::option::of(address())).prop_map(
        |(name, phone, clinic, address)| VetContact {
            name,
            phone,
            clinic,
            address,
        },
    )
}

fn pet() -> impl Strategy<Value = Pet> {
    (
        (text(), text(), text(), species()),
        (
            opt_text(),
            prop::option::of(date()),
            prop::option::of(amount(500)),
            opt_text(),
        ),
        prop::option::of(vet()),
        (timestamp(), timestamp()),
        extra(),
    )
        .prop_map(
            |(
                (id, owner_id, name, species),
                (breed, birth_date, weight_kg, microchip_id),
                vet,
                (created_at, updated_at),
                extra,
            )| Pet {
                id,
                owner_id,
                name,
                species,
                breed,
                birth_date,
                weight_kg,
                microchip_id,
                vet,
                created_at,
                updated_at,
                extra,
            },
        )
}

fn record_type() -> impl Strategy<Value = HealthRecordType> {
    prop::sample::select(vec![
        HealthRecordType::Vaccination,
        HealthRecordType::Checkup,
        HealthRecordType::Illness,
        HealthRecordType::Injury,
        HealthRecordType::Surgery,
        HealthRecordType::Dental,
        HealthRecordType::Other,
    ])
}

fn provider() -> impl Strategy<Value = ProviderInfo> {
    (text(), opt_text(), opt_text()).prop_map(|(name, clinic, phone)| ProviderInfo {
        name,
        clinic,
        phone,
    })
}

fn attachment() -> impl Strategy<Value = Attachment> {
    (text(), text(), opt_text()).prop_map(|(name, url, mime_type)| Attachment {
        name,
        url,
        mime_type,
    })
}

fn health_record() -> impl Strategy<Value = HealthRecord> {
    (
        (text(), text(), text(), record_type(), text()),
        (
            timestamp(),
            prop::option::of(provider()),
            prop::collection::vec(attachment(), 0..4),
        ),
        (any::<bool>(), prop::option::of(timestamp()), opt_text()),
        (timestamp(), timestamp()),
        extra(),
    )
        .prop_map(
            |(
                (id, owner_id, pet_id, record_type, title),
                (date, provider, attachments),
                (needs_follow_up, follow_up_date, notes),
                (created_at, updated_at),
                extra,
            )| HealthRecord {
                id,
                owner_id,
                pet_id,
                record_type,
                title,
                date,
                provider,
                attachments,
                needs_follow_up,
                follow_up_date,
                notes,
                created_at,
                updated_at,
                extra,
            },
        )
}

fn meal_item() -> impl Strategy<Value = MealItem> {
    (opt_text(), text(), amount(2000)).prop_map(|(food_item_id, name, grams)| MealItem {
        food_item_id,
        name,
        grams,
    })
}

fn meal() -> impl Strategy<Value = Meal> {
    (
        (text(), text(), text(), prop::sample::select(MealType::ALL.to_vec())),
        (timestamp(), prop::collection::vec(meal_item(), 0..5), opt_text()),
        timestamp(),
        extra(),
    )
        .prop_map(
            |((id, owner_id, pet_id, meal_type), (fed_at, items, notes), created_at, extra)| Meal {
                id,
                owner_id,
                pet_id,
                meal_type,
                fed_at,
                items,
                notes,
                created_at,
                extra,
            },
        )
}

fn camel_identifier() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,6}([A-Z][a-z0-9]{1,6}){0,3}").unwrap()
}

fn snake_identifier() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,6}(_[a-z][a-z0-9]{0,6}){0,3}").unwrap()
}

// =============================================================================
// EXPECTED SHAPES
// =============================================================================

fn millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(3)
}

fn pet_at_wire_precision(mut pet: Pet) -> Pet {
    pet.created_at = millis(pet.created_at);
    pet.updated_at = millis(pet.updated_at);
    pet
}

fn health_at_wire_precision(mut record: HealthRecord) -> HealthRecord {
    record.date = millis(record.date);
    record.follow_up_date = record.follow_up_date.map(millis);
    record.created_at = millis(record.created_at);
    record.updated_at = millis(record.updated_at);
    record
}

fn meal_at_wire_precision(mut meal: Meal) -> Meal {
    meal.fed_at = millis(meal.fed_at);
    meal.created_at = millis(meal.created_at);
    meal
}

fn assert_wire_names<T: Entity>(wire: &Map<String, Value>) -> Result<(), TestCaseError> {
    for field in T::FIELDS {
        prop_assert!(wire.contains_key(&field.wire_name()), "missing {}", field.wire_name());
        if field.local != field.wire_name() {
            prop_assert!(!wire.contains_key(field.local), "local name {} leaked", field.local);
        }
    }
    Ok(())
}

// =============================================================================
// ROUND TRIP
// =============================================================================

mod round_trip {
    use super::*;

    proptest! {
        #[test]
        fn pet_survives_wire(pet in pet()) {
            let wire = to_wire(&pet).unwrap();
            assert_wire_names::<Pet>(&wire)?;

            let decoded: Pet = from_wire(wire).unwrap();
            prop_assert_eq!(decoded, pet_at_wire_precision(pet));
        }

        #[test]
        fn health_record_survives_wire(record in health_record()) {
            let wire = to_wire(&record).unwrap();
            assert_wire_names::<HealthRecord>(&wire)?;

            let decoded: HealthRecord = from_wire(wire).unwrap();
            prop_assert_eq!(decoded, health_at_wire_precision(record));
        }

        #[test]
        fn meal_survives_wire(meal in meal()) {
            let wire = to_wire(&meal).unwrap();
            assert_wire_names::<Meal>(&wire)?;

            let decoded: Meal = from_wire(wire).unwrap();
            prop_assert_eq!(decoded, meal_at_wire_precision(meal));
        }

        /// Encoding an already-decoded record gives the same wire record.
        #[test]
        fn wire_form_is_stable(pet in pet()) {
            let wire = to_wire(&pet).unwrap();
            let decoded: Pet = from_wire(wire.clone()).unwrap();
            prop_assert_eq!(to_wire(&decoded).unwrap(), wire);
        }

        #[test]
        fn extra_keys_pass_through_unchanged(pet in pet()) {
            let wire = to_wire(&pet).unwrap();
            for (key, value) in &pet.extra {
                prop_assert_eq!(wire.get(key), Some(value));
            }

            let decoded: Pet = from_wire(wire).unwrap();
            prop_assert_eq!(decoded.extra, pet.extra);
        }
    }
}

// =============================================================================
// NAMING
// =============================================================================

mod naming {
    use super::*;

    proptest! {
        #[test]
        fn camel_to_snake_is_inverted(name in camel_identifier()) {
            let snake = camel_to_snake(&name);
            prop_assert!(!snake.chars().any(|c| c.is_ascii_uppercase()));
            prop_assert_eq!(snake_to_camel(&snake), name);
        }

        #[test]
        fn snake_to_camel_is_inverted(name in snake_identifier()) {
            let camel = snake_to_camel(&name);
            prop_assert!(!camel.contains('_'));
            prop_assert_eq!(camel_to_snake(&camel), name);
        }
    }
}
