/// Get the current UTC timestamp (milliseconds)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a new opaque resource id (UUID v4, hyphenless)
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Generate a human-readable order number: ORD-<seconds>-<4 random digits>
///
/// Unique in practice at this order volume; the database still enforces
/// uniqueness on the column.
pub fn order_number() -> String {
    use rand::Rng;
    let ts = chrono::Utc::now().timestamp();
    let rand_part: u32 = rand::thread_rng().gen_range(1000..10000);
    format!("ORD-{}-{}", ts, rand_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_shape() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn test_order_number_shape() {
        let n = order_number();
        assert!(n.starts_with("ORD-"));
        let parts: Vec<&str> = n.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 4);
    }
}
