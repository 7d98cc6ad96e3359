use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use rowset_domain::{Decimal, Handle, Row, RowId, SerialObject, Value};

fn arb_value() -> impl Strategy<Value = Value> {
  let null = Just(Value::Null);
  let boolean = any::<bool>().prop_map(Value::Boolean);
  let small = any::<i16>().prop_map(Value::SmallInt);
  let integer = any::<i32>().prop_map(Value::Integer);
  let big = any::<i64>().prop_map(Value::BigInt);

  // 避免 NaN/Inf (否则 PartialEq roundtrip 会失败)
  let double = proptest::num::f64::ANY
    .prop_filter("finite f64", |f| f.is_finite())
    .prop_map(Value::Double);

  let decimal = (any::<i64>(), 0u8..=10).prop_map(|(u, s)| {
    Value::Decimal(Decimal::new(i128::from(u), s).unwrap_or_else(|_| Decimal::from_i64(u)))
  });

  let text = proptest::collection::vec(any::<char>(), 0..64).prop_map(|chars| Value::Text(chars.into_iter().collect()));

  let bytes = proptest::collection::vec(any::<u8>(), 0..256).prop_map(Value::Bytes);

  let timestamp = (0i64..4_000_000_000).prop_map(|secs| {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
    epoch.map_or(Value::Null, |e: NaiveDateTime| Value::Timestamp(e + chrono::Duration::seconds(secs)))
  });

  let date = (1i32..=9999, 1u32..=12, 1u32..=28)
    .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).map_or(Value::Null, Value::Date));

  let clob = ".{0,32}".prop_map(|s| Value::Handle(Handle::Serial(SerialObject::Clob(s))));

  prop_oneof![null, boolean, small, integer, big, double, decimal, text, bytes, timestamp, date, clob]
}

proptest! {
  #[test]
  fn value_serde_roundtrip_bincode(v in arb_value()) {
    let bytes = bincode::serialize(&v).unwrap();
    let de: Value = bincode::deserialize(&bytes).unwrap();

    prop_assert_eq!(v, de);
  }

  #[test]
  fn update_then_revert_restores_row(
    values in proptest::collection::vec(arb_value(), 1..8),
    replacement in arb_value(),
    column in any::<prop::sample::Index>(),
  ) {
    let mut row = Row::new(RowId::new(1), values.clone());
    let i = column.index(values.len()) + 1;

    row.update(i, replacement.clone()).unwrap();
    prop_assert_eq!(row.get(i).unwrap(), &replacement);
    prop_assert!(row.is_column_updated(i).unwrap());

    row.revert_to_original();
    prop_assert_eq!(row.values(), values.as_slice());
    prop_assert!(!row.any_updated());
  }

  #[test]
  fn decimal_display_parse_roundtrip(u in any::<i64>(), s in 0u8..=18) {
    let d = Decimal::new(i128::from(u), s).unwrap();
    let parsed: Decimal = d.to_string().parse().unwrap();
    prop_assert_eq!(d, parsed);
  }
}
