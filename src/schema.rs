diesel::table! {
    appointments (id) {
        id -> Uuid,
        title -> Text,
        starts_at -> Timestamp,
        ends_at -> Timestamp,
        phone -> Text,
        service_type -> Text,
        notes -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
