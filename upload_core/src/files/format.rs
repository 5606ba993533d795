const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Renders a byte count with binary units, e.g. `1536` as `"1.50 KB"`.
pub fn format_file_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = size_bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", value, SIZE_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_bytes() {
        assert_eq!(format_file_size(0), "0 Bytes");
    }

    #[test]
    fn test_small_sizes_stay_in_bytes() {
        assert_eq!(format_file_size(1), "1.00 Bytes");
        assert_eq!(format_file_size(10), "10.00 Bytes");
        assert_eq!(format_file_size(1023), "1023.00 Bytes");
    }

    #[test]
    fn test_unit_escalation() {
        assert_eq!(format_file_size(1024), "1.00 KB");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_file_size(16 * 1024 * 1024), "16.00 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3.00 GB");
        assert_eq!(format_file_size(1024u64.pow(4)), "1.00 TB");
    }

    #[test]
    fn test_terabytes_is_the_largest_unit() {
        assert_eq!(format_file_size(2048 * 1024u64.pow(4)), "2048.00 TB");
    }

    #[test]
    fn test_unit_is_never_larger_than_needed() {
        for bytes in [1u64, 512, 1023, 1024, 1025, 1_048_576, 5_000_000_000] {
            let formatted = format_file_size(bytes);
            let (value, unit) = formatted.split_once(' ').unwrap();
            let value: f64 = value.parse().unwrap();
            assert!(value < 1024.0 || unit == "TB", "{} -> {}", bytes, formatted);
            if bytes < 1024 {
                assert_eq!(unit, "Bytes");
            }
        }
    }
}
