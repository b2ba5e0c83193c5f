//! Bidirectional parameter mapper
//!
//! Converts parameter sets between the stable motionEye namespace and the
//! namespace of one motion daemon version. Conversion never fails: anything
//! it cannot map is passed through or skipped and reported as a
//! [`Diagnostic`]. Only (re)loading tables returns errors.

use tracing::{info, warn};

use crate::constants::params::{BOOL_OFF, BOOL_ON, LIST_SEPARATOR, PAIR_SEPARATOR, RESERVED_PREFIX};
use crate::diagnostic::{Conversion, Diagnostic};
use crate::error::Result;
use crate::table::{CanonicalTable, DaemonTable, DaemonType, TableStore};
use crate::types::{ParamType, ParamValue, ParameterSet};

pub struct MotionConfigMapper {
    store: TableStore,
    canonical: CanonicalTable,
    daemon: DaemonTable,
    reserved_prefix: String,
}

impl MotionConfigMapper {
    /// Load the canonical table and the (non-strictly resolved) table for
    /// `version`, or for the store's default version when `None`
    pub fn new(store: TableStore, version: Option<&str>) -> Result<Self> {
        Self::open(store, version, false)
    }

    /// Like [`Self::new`], resolving `version` strictly when `strict` is set
    pub fn open(store: TableStore, version: Option<&str>, strict: bool) -> Result<Self> {
        let canonical = store.load_canonical()?;
        let version = version.unwrap_or(store.default_version()).to_string();
        let daemon = store.load_daemon(&version, strict)?;

        let mapper = Self {
            store,
            canonical,
            daemon,
            reserved_prefix: RESERVED_PREFIX.to_string(),
        };
        mapper.check_pairing();
        Ok(mapper)
    }

    /// Build from tables already in memory; reloads go through `store`
    pub fn from_tables(store: TableStore, canonical: CanonicalTable, daemon: DaemonTable) -> Self {
        let mapper = Self {
            store,
            canonical,
            daemon,
            reserved_prefix: RESERVED_PREFIX.to_string(),
        };
        mapper.check_pairing();
        mapper
    }

    /// Keys starting with `prefix` bypass mapping; an empty prefix disables this
    pub fn with_reserved_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_prefix = prefix.into();
        self
    }

    pub fn canonical_table(&self) -> &CanonicalTable {
        &self.canonical
    }

    pub fn daemon_table(&self) -> &DaemonTable {
        &self.daemon
    }

    /// Replace the daemon table. On error the previous table stays loaded.
    pub fn load_daemon_map(&mut self, version: &str, strict: bool) -> Result<&DaemonTable> {
        let table = self.store.load_daemon(version, strict)?;
        self.daemon = table;
        self.check_pairing();
        Ok(&self.daemon)
    }

    /// Daemon namespace → canonical namespace, reloading first if `version`
    /// differs from the version the current table was requested for
    pub fn convert_from_version(&mut self, params: &ParameterSet, version: Option<&str>) -> Result<Conversion> {
        self.ensure_version(version)?;
        Ok(self.to_canonical(params))
    }

    /// Canonical namespace → daemon namespace, reloading like [`Self::convert_from_version`]
    pub fn convert_to_version(&mut self, params: &ParameterSet, version: Option<&str>) -> Result<Conversion> {
        self.ensure_version(version)?;
        Ok(self.to_daemon(params))
    }

    /// Daemon version `from` → canonical → daemon version `to`
    ///
    /// Leaves the mapper holding the `to` table.
    pub fn translate(&mut self, params: &ParameterSet, from: &str, to: &str) -> Result<Conversion> {
        let canonical = self.convert_from_version(params, Some(from))?;
        let mut converted = self.convert_to_version(&canonical.params, Some(to))?;

        let mut diagnostics = canonical.diagnostics;
        diagnostics.append(&mut converted.diagnostics);
        converted.diagnostics = diagnostics;
        Ok(converted)
    }

    pub fn to_canonical(&self, params: &ParameterSet) -> Conversion {
        let mut out = Conversion::default();

        for (key, value) in params.iter() {
            if self.daemon.is_list_group(key) {
                self.unpack_group(key, value, &mut out);
            } else if let Some(canonical) = self.daemon.canonical_for(key) {
                out.params.insert(canonical, value.clone());
            } else {
                out.params.insert(key, value.clone());
            }
        }

        out
    }

    pub fn to_daemon(&self, params: &ParameterSet) -> Conversion {
        let mut out = Conversion::default();

        for (key, value) in params.iter() {
            if !self.reserved_prefix.is_empty() && key.starts_with(&self.reserved_prefix) {
                out.params.insert(key, value.clone());
                continue;
            }

            if !self.canonical.contains(key) {
                out.report(Diagnostic::UnknownParameter { key: key.to_string() });
                continue;
            }

            let Some(spec) = self.daemon.get(key) else {
                if let Some(formatted) = self.format_into(key, value, &mut out) {
                    out.params.insert(key, formatted);
                }
                continue;
            };

            match &spec.daemon_type {
                DaemonType::Unsupported => {
                    out.report(Diagnostic::UnsupportedParameter { key: key.to_string() });
                    out.params.insert(key, value.clone());
                }
                DaemonType::ListMember { list_group } => {
                    if let Some(formatted) = self.format_into(key, value, &mut out) {
                        let fragment = format!("{}{PAIR_SEPARATOR}{formatted}", spec.effective_name());
                        append_fragment(&mut out.params, list_group, fragment);
                    }
                }
                DaemonType::Normal => {
                    if let Some(formatted) = self.format_into(key, value, &mut out) {
                        out.params.insert(spec.effective_name(), formatted);
                    }
                }
            }
        }

        out
    }

    /// Coerce `value` to the canonical type of `key`
    ///
    /// Returns `None` for keys outside the canonical namespace.
    pub fn format_value(&self, key: &str, value: &ParamValue) -> Option<ParamValue> {
        self.format_into(key, value, &mut Conversion::default())
    }

    fn format_into(&self, key: &str, value: &ParamValue, out: &mut Conversion) -> Option<ParamValue> {
        let Some(param_type) = self.canonical.param_type(key) else {
            out.report(Diagnostic::NoValueProduced { key: key.to_string() });
            return None;
        };

        let formatted = match (param_type, value) {
            (ParamType::Bool, ParamValue::Bool(b)) => on_off(*b),
            (ParamType::Bool, ParamValue::Int(n)) => on_off(*n != 0),
            (ParamType::Bool, ParamValue::Str(_)) => value.clone(),
            (ParamType::Int, ParamValue::Int(_)) => value.clone(),
            (ParamType::Int, ParamValue::Bool(b)) => ParamValue::Int(i64::from(*b)),
            (ParamType::Int, ParamValue::Str(s)) => match s.trim().parse::<i64>() {
                Ok(n) => ParamValue::Int(n),
                Err(_) => {
                    out.report(Diagnostic::InvalidValue {
                        key: key.to_string(),
                        value: value.clone(),
                        expected: ParamType::Int,
                    });
                    value.clone()
                }
            },
            (ParamType::String, _) => value.clone(),
        };
        Some(formatted)
    }

    fn unpack_group(&self, group: &str, value: &ParamValue, out: &mut Conversion) {
        let packed = value.to_string();

        for item in packed.split(LIST_SEPARATOR).map(str::trim) {
            if item.is_empty() {
                continue;
            }

            let Some((subkey, subvalue)) = item
                .split_once(PAIR_SEPARATOR)
                .map(|(k, v)| (k.trim(), v.trim()))
                .filter(|(k, _)| !k.is_empty())
            else {
                out.report(Diagnostic::InvalidPackedEntry {
                    group: group.to_string(),
                    entry: item.to_string(),
                });
                continue;
            };

            let name = self.daemon.canonical_for_member(group, subkey).unwrap_or(subkey);
            out.params.insert(name, subvalue);
        }
    }

    fn ensure_version(&mut self, version: Option<&str>) -> Result<()> {
        match version {
            Some(v) if v != self.daemon.requested_version() => {
                info!(from = %self.daemon.requested_version(), to = %v, "Switching motion mapping table");
                self.load_daemon_map(v, false)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Daemon entries should reference canonical names; stray ones only work daemon → canonical
    fn check_pairing(&self) {
        for spec in self.daemon.iter() {
            if !self.canonical.contains(&spec.canonical_name) {
                warn!(key = %spec.canonical_name, version = %self.daemon.version(), "motion table entry has no canonical counterpart");
            }
        }
    }
}

fn on_off(value: bool) -> ParamValue {
    ParamValue::from(if value { BOOL_ON } else { BOOL_OFF })
}

/// Start `group` with `fragment`, or append `,fragment` keeping the group's first-seen position
fn append_fragment(params: &mut ParameterSet, group: &str, fragment: String) {
    match params.get_mut(group) {
        Some(existing) => {
            let mut packed = existing.to_string();
            packed.push(LIST_SEPARATOR);
            packed.push_str(&fragment);
            *existing = ParamValue::Str(packed);
        }
        None => {
            params.insert(group, fragment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    const CANONICAL: &str = r#"
params:
  width:
    type: int
  height:
    type: int
  netcam_url:
    type: string
  netcam_keepalive:
    type: bool
  netcam_tolerant_check:
    type: bool
  netcam_use_tcp:
    type: bool
  movie_quality:
    type: int
  picture_exif:
    type: string
  text_left:
    type: string
"#;

    const MOTION_44: &str = r#"
params:
  netcam_keepalive:
    mname: keepalive
    mlist_name: netcam_params
  netcam_tolerant_check:
    mname: tolerant_check
    mlist_name: netcam_params
  netcam_use_tcp:
    mname: ''
    mlist_name: netcam_params
  movie_quality:
    mname: movie_quality
  netcam_url:
    mname: netcam_url
  text_left:
    mname: text_left
  picture_exif:
    mtype: none
"#;

    const MOTION_42: &str = r#"
params:
  netcam_use_tcp:
    mname: rtsp_uses_tcp
  movie_quality:
    mname: ffmpeg_variable_bitrate
"#;

    fn mapper() -> MotionConfigMapper {
        MotionConfigMapper::from_tables(
            TableStore::default(),
            CanonicalTable::from_yaml_str(CANONICAL).unwrap(),
            DaemonTable::from_yaml_str(MOTION_44, "4.4").unwrap(),
        )
    }

    fn store_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("motioneye.yaml"), CANONICAL).unwrap();
        fs::write(dir.path().join("motion_4.4.yaml"), MOTION_44).unwrap();
        fs::write(dir.path().join("motion_4.2.yaml"), MOTION_42).unwrap();
        dir
    }

    fn set(pairs: &[(&str, ParamValue)]) -> ParameterSet {
        pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
    }

    fn s(value: &str) -> ParamValue {
        ParamValue::from(value)
    }

    #[test]
    fn test_pack_list_member() {
        let mapper = mapper();
        let input = set(&[("width", ParamValue::Int(640)), ("netcam_keepalive", ParamValue::Bool(true))]);

        let out = mapper.to_daemon(&input);
        assert!(out.is_clean());
        assert_eq!(out.params, set(&[("width", ParamValue::Int(640)), ("netcam_params", s("keepalive=on"))]));
    }

    #[test]
    fn test_unpack_list_group() {
        let mapper = mapper();
        let input = set(&[("width", s("640")), ("netcam_params", s("keepalive=on"))]);

        let out = mapper.to_canonical(&input);
        assert!(out.is_clean());
        assert_eq!(out.params, set(&[("width", s("640")), ("netcam_keepalive", s("on"))]));
    }

    #[test]
    fn test_list_packing_preserves_order() {
        let mapper = mapper();
        let input = set(&[
            ("netcam_use_tcp", ParamValue::Bool(false)),
            ("width", ParamValue::Int(320)),
            ("netcam_keepalive", ParamValue::Bool(true)),
            ("netcam_tolerant_check", ParamValue::Bool(true)),
        ]);

        let packed = mapper.to_daemon(&input).params;
        let keys: Vec<_> = packed.keys().collect();
        assert_eq!(keys, vec!["netcam_params", "width"]);
        assert_eq!(
            packed.get("netcam_params"),
            Some(&s("netcam_use_tcp=off,keepalive=on,tolerant_check=on"))
        );

        let unpacked = mapper.to_canonical(&packed).params;
        let keys: Vec<_> = unpacked.keys().collect();
        assert_eq!(keys, vec!["netcam_use_tcp", "netcam_keepalive", "netcam_tolerant_check", "width"]);
    }

    #[test]
    fn test_round_trip_normal_mappings() {
        let mapper = mapper();
        let input = set(&[
            ("netcam_url", s("rtsp://cam.local/stream")),
            ("movie_quality", ParamValue::Int(75)),
            ("height", ParamValue::Int(480)),
        ]);

        let there = mapper.to_daemon(&input);
        let back = mapper.to_canonical(&there.params);
        assert_eq!(back.params, input);
    }

    #[test]
    fn test_round_trip_bool_comes_back_formatted() {
        let store = TableStore::default();
        let canonical = CanonicalTable::from_yaml_str(CANONICAL).unwrap();
        let daemon = DaemonTable::from_yaml_str(MOTION_42, "4.2").unwrap();
        let mapper = MotionConfigMapper::from_tables(store, canonical, daemon);

        let input = set(&[("netcam_use_tcp", ParamValue::Bool(true)), ("width", ParamValue::Int(640))]);
        let there = mapper.to_daemon(&input);
        assert_eq!(there.params, set(&[("rtsp_uses_tcp", s("on")), ("width", ParamValue::Int(640))]));

        let back = mapper.to_canonical(&there.params);
        assert_eq!(back.params, set(&[("netcam_use_tcp", s("on")), ("width", ParamValue::Int(640))]));
        assert_eq!(mapper.format_value("netcam_use_tcp", &s("on")), Some(s("on")));
    }

    #[test]
    fn test_unknown_canonical_key_dropped() {
        let mapper = mapper();
        let input = set(&[("bogus", s("1")), ("width", ParamValue::Int(1))]);

        let out = mapper.to_daemon(&input);
        assert_eq!(out.params, set(&[("width", ParamValue::Int(1))]));
        assert_eq!(out.diagnostics, vec![Diagnostic::UnknownParameter { key: "bogus".to_string() }]);
    }

    #[test]
    fn test_unsupported_preserved_verbatim() {
        let mapper = mapper();
        let input = set(&[("picture_exif", s("  %Y-%m-%d  ,=x "))]);

        let out = mapper.to_daemon(&input);
        assert_eq!(out.params, input);
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::UnsupportedParameter { key: "picture_exif".to_string() }]
        );
    }

    #[test]
    fn test_absent_override_formats_under_same_key() {
        let mapper = mapper();
        let out = mapper.to_daemon(&set(&[("height", s(" 480 "))]));
        assert_eq!(out.params, set(&[("height", ParamValue::Int(480))]));
    }

    #[test]
    fn test_reserved_prefix_passes_through() {
        let mapper = mapper();
        let input = set(&[("@name", s("Front door")), ("@enabled", ParamValue::Bool(true))]);
        assert_eq!(mapper.to_daemon(&input).params, input);

        let disabled = mapper.with_reserved_prefix("");
        let out = disabled.to_daemon(&input);
        assert!(out.params.is_empty());
        assert_eq!(out.diagnostics.len(), 2);
    }

    #[test]
    fn test_format_value_rules() {
        let mapper = mapper();
        assert_eq!(mapper.format_value("netcam_keepalive", &ParamValue::Bool(false)), Some(s("off")));
        assert_eq!(mapper.format_value("netcam_keepalive", &ParamValue::Int(2)), Some(s("on")));
        assert_eq!(mapper.format_value("netcam_keepalive", &s("off")), Some(s("off")));
        assert_eq!(mapper.format_value("width", &s("1024")), Some(ParamValue::Int(1024)));
        assert_eq!(mapper.format_value("width", &ParamValue::Bool(true)), Some(ParamValue::Int(1)));
        assert_eq!(mapper.format_value("netcam_url", &ParamValue::Int(5)), Some(ParamValue::Int(5)));
        assert_eq!(mapper.format_value("bogus", &s("x")), None);
    }

    #[test]
    fn test_invalid_int_keeps_raw_value() {
        let mapper = mapper();
        let out = mapper.to_daemon(&set(&[("movie_quality", s("high"))]));
        assert_eq!(out.params, set(&[("movie_quality", s("high"))]));
        assert!(matches!(
            out.diagnostics.as_slice(),
            [Diagnostic::InvalidValue { expected: ParamType::Int, .. }]
        ));
    }

    #[test]
    fn test_invalid_packed_entries_are_skipped() {
        let mapper = mapper();
        let input = set(&[
            ("netcam_params", s("keepalive=on, broken ,=off,,tolerant_check = off,url=a=b")),
            ("width", s("10")),
        ]);

        let out = mapper.to_canonical(&input);
        assert_eq!(
            out.params,
            set(&[
                ("netcam_keepalive", s("on")),
                ("netcam_tolerant_check", s("off")),
                ("url", s("a=b")),
                ("width", s("10")),
            ])
        );
        assert_eq!(
            out.diagnostics,
            vec![
                Diagnostic::InvalidPackedEntry { group: "netcam_params".to_string(), entry: "broken".to_string() },
                Diagnostic::InvalidPackedEntry { group: "netcam_params".to_string(), entry: "=off".to_string() },
            ]
        );
    }

    #[test]
    fn test_packed_subvalue_keeps_inner_spaces() {
        let mapper = mapper();
        let input = set(&[("netcam_params", s("keepalive= on , text=a b,tolerant_check=off "))]);

        let out = mapper.to_canonical(&input);
        assert!(out.is_clean());
        assert_eq!(
            out.params,
            set(&[
                ("netcam_keepalive", s("on")),
                ("text", s("a b")),
                ("netcam_tolerant_check", s("off")),
            ])
        );
    }

    #[test]
    fn test_unmapped_daemon_keys_pass_through() {
        let mapper = mapper();
        let input = set(&[("threshold", s("1500")), ("keepalive", s("on"))]);
        assert_eq!(mapper.to_canonical(&input).params, input);
    }

    #[test]
    fn test_later_normal_mapping_overwrites() {
        let store = TableStore::default();
        let canonical = CanonicalTable::from_yaml_str(CANONICAL).unwrap();
        let daemon = DaemonTable::from_yaml_str(MOTION_42, "4.2").unwrap();
        let mapper = MotionConfigMapper::from_tables(store, canonical, daemon);

        let out = mapper.to_canonical(&set(&[
            ("movie_quality", s("10")),
            ("ffmpeg_variable_bitrate", s("20")),
        ]));
        assert_eq!(out.params, set(&[("movie_quality", s("20"))]));
    }

    #[test]
    fn test_group_appends_after_non_string_value() {
        let mut params = set(&[("netcam_params", ParamValue::Int(1))]);
        append_fragment(&mut params, "netcam_params", "keepalive=on".to_string());
        assert_eq!(params.get("netcam_params"), Some(&s("1,keepalive=on")));
    }

    #[test]
    fn test_new_resolves_and_switches_versions() {
        let dir = store_dir();
        let mut mapper = MotionConfigMapper::new(TableStore::new(dir.path()), Some("4.2.2")).unwrap();
        assert_eq!(mapper.daemon_table().version(), "4.2");

        let input = set(&[("netcam_use_tcp", ParamValue::Bool(true))]);
        let out = mapper.convert_to_version(&input, None).unwrap();
        assert_eq!(out.params, set(&[("rtsp_uses_tcp", s("on"))]));

        let out = mapper.convert_to_version(&input, Some("4.4.0")).unwrap();
        assert_eq!(out.params, set(&[("netcam_params", s("netcam_use_tcp=on"))]));
        assert_eq!(mapper.daemon_table().version(), "4.4");
    }

    #[test]
    fn test_failed_reload_keeps_previous_table() {
        let dir = store_dir();
        let mut mapper = MotionConfigMapper::new(TableStore::new(dir.path()), None).unwrap();
        assert_eq!(mapper.daemon_table().version(), "4.4");

        assert!(mapper.load_daemon_map("4.2.2", true).is_err());
        assert_eq!(mapper.daemon_table().version(), "4.4");
    }

    #[test]
    fn test_open_strict() {
        let dir = store_dir();
        let err = MotionConfigMapper::open(TableStore::new(dir.path()), Some("4.2.2"), true).err();
        assert!(matches!(err, Some(crate::MapperError::UnresolvedVersion { .. })));

        let mapper = MotionConfigMapper::open(TableStore::new(dir.path()), Some("4.2"), true).unwrap();
        assert_eq!(mapper.daemon_table().resolution(), crate::Resolution::Exact);
    }

    #[test]
    fn test_translate_between_versions() {
        let dir = store_dir();
        let mut mapper = MotionConfigMapper::new(TableStore::new(dir.path()), None).unwrap();

        let v42 = set(&[("rtsp_uses_tcp", s("on")), ("ffmpeg_variable_bitrate", s("60")), ("width", s("800"))]);
        let out = mapper.translate(&v42, "4.2", "4.4").unwrap();
        assert_eq!(
            out.params,
            set(&[
                ("netcam_params", s("netcam_use_tcp=on")),
                ("movie_quality", ParamValue::Int(60)),
                ("width", ParamValue::Int(800)),
            ])
        );
        assert_eq!(mapper.daemon_table().version(), "4.4");
    }

    #[test]
    fn test_shipped_tables() {
        let tables = Path::new(env!("CARGO_MANIFEST_DIR")).join("tables");
        let store = TableStore::new(&tables);

        for version in store.available_versions().unwrap() {
            let mapper = MotionConfigMapper::new(store.clone(), Some(version.as_str())).unwrap();
            assert_eq!(mapper.daemon_table().version(), version);
            for spec in mapper.daemon_table().iter() {
                assert!(
                    mapper.canonical_table().contains(&spec.canonical_name),
                    "{} in motion_{}.yaml has no canonical entry",
                    spec.canonical_name,
                    version
                );
            }
        }

        let mut mapper = MotionConfigMapper::new(store, Some("4.4.0")).unwrap();
        let input = set(&[
            ("width", ParamValue::Int(640)),
            ("netcam_keepalive", ParamValue::Bool(true)),
            ("netcam_tolerant_check", ParamValue::Bool(true)),
        ]);
        let out = mapper.convert_to_version(&input, None).unwrap();
        assert_eq!(
            out.params,
            set(&[("width", ParamValue::Int(640)), ("netcam_params", s("keepalive=on,tolerant_check=on"))])
        );

        let out = mapper.convert_to_version(&input, Some("4.2.2")).unwrap();
        assert_eq!(
            out.params,
            set(&[
                ("width", ParamValue::Int(640)),
                ("netcam_keepalive", s("on")),
                ("netcam_tolerant_check", s("on")),
            ])
        );
    }
}
