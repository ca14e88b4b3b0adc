/// Splits `name` into a short column name and an optional owning table,
/// following the `name@table` convention used for column disambiguation.
pub(crate) fn split_qualified(name: &str) -> (&str, Option<&str>) {
    match name.split_once('@') {
        Some((short, table)) => (short, Some(table)),
        None => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_qualified_names() {
        assert_eq!(split_qualified("lat@hdr"), ("lat", Some("hdr")));
        assert_eq!(split_qualified("lat"), ("lat", None));
    }
}
