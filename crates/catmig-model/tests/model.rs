use catmig_model::{
    FieldPath, ModelError, ObjectType, SourceRecord, TargetRecord, generate, normalize_key,
};
use serde_json::json;

#[test]
fn casing_variants_normalize_to_one_key() {
    for raw in [" Barcode ", "BARCODE", "barcode"] {
        assert_eq!(normalize_key(raw), "barcode");
    }
    let record = SourceRecord::from_row([(" Barcode ", "39001")]);
    for lookup in ["barcode", "BARCODE", " Barcode "] {
        assert_eq!(record.text(lookup), Some("39001"));
    }
}

#[test]
fn unknown_key_is_key_not_found() {
    let record = SourceRecord::from_row([("barcode", "1")]);
    assert_eq!(
        record.get("callnumber"),
        Err(ModelError::KeyNotFound("callnumber".to_string()))
    );
}

#[test]
fn object_type_aliases() {
    assert_eq!(ObjectType::parse("Items").unwrap(), ObjectType::Item);
    assert_eq!(ObjectType::parse("holdings-record").unwrap(), ObjectType::Holdings);
    assert_eq!("patrons".parse::<ObjectType>().unwrap(), ObjectType::User);
    assert!(ObjectType::parse("shelf").is_err());
}

#[test]
fn target_record_carries_generated_id() {
    let mut record = TargetRecord::new();
    record
        .set(&FieldPath::parse("title").unwrap(), json!("Cats"))
        .unwrap();
    let id = generate("tenant", "L1", ObjectType::Item);
    record.set_id(id);
    assert_eq!(record.id(), Some(id.to_string().as_str()));
    assert_eq!(record.to_value()["title"], json!("Cats"));
}
