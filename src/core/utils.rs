use std::collections::HashMap;

/// Parse `key=value` assignments; entries without `=` are ignored.
pub fn parse_vars(vars: &[String]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for v in vars {
        if let Some((key, value)) = v.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vars_trims_and_skips_invalid() {
        let map = parse_vars(&[
            " name = Alice ".to_string(),
            "broken".to_string(),
            "eq=a=b".to_string(),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["name"], "Alice");
        assert_eq!(map["eq"], "a=b");
    }
}
