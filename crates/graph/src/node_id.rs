//! Canonical node ids.
//!
//! Ids arrive in several spellings: `pkg/a.py::f`, `pkg\a.py.f`, `pkg.a.f`,
//! `external::requests.get`. All of them collapse to one dotted form.

/// Collapse `/`, `\` and `::` to `.` and drop a `.py` suffix on any path segment
pub fn normalize_id(raw: &str) -> String {
    let unified = raw.trim().replace("::", "/").replace('\\', "/");
    unified
        .split('/')
        .map(|segment| segment.strip_suffix(".py").unwrap_or(segment))
        .flat_map(|segment| segment.split('.'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Last dotted segment of an id
pub fn short_name(id: &str) -> &str {
    id.rsplit(['.', ':']).find(|s| !s.is_empty()).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn variant_spellings_collapse() {
        for raw in [
            "pkg/a.py::helper",
            "pkg\\a.py.helper",
            "pkg.a.helper",
            "./pkg/a.py/helper",
            "pkg::a::helper",
        ] {
            assert_eq!(normalize_id(raw), "pkg.a.helper", "{raw}");
        }
    }

    #[test]
    fn names_ending_in_py_letters_are_kept() {
        assert_eq!(normalize_id("lib.happy"), "lib.happy");
        assert_eq!(normalize_id("external::numpy.array"), "external.numpy.array");
    }

    #[test]
    fn short_names() {
        assert_eq!(short_name("pkg.a.helper"), "helper");
        assert_eq!(short_name("external::print"), "print");
        assert_eq!(short_name("main"), "main");
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z_][a-z0-9_]{0,8}".prop_filter("py suffix", |s| s != "py")
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in "[a-oq-z_./:\\\\]{0,30}") {
            let once = normalize_id(&raw);
            prop_assert_eq!(normalize_id(&once), once);
        }

        #[test]
        fn separator_style_does_not_matter(parts in prop::collection::vec(segment(), 1..5)) {
            let dotted = parts.join(".");
            let slashed = format!("{}.py", parts.join("/"));
            let colons = parts.join("::");
            prop_assert_eq!(normalize_id(&slashed), dotted.clone());
            prop_assert_eq!(normalize_id(&colons), dotted.clone());
            prop_assert_eq!(normalize_id(&dotted), dotted);
        }
    }
}
