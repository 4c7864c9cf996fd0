use std::collections::HashMap;
use std::env;

use lazy_static::lazy_static;

#[derive(strum_macros::Display, Eq, PartialEq, Debug, Hash, Clone, Copy)]
pub enum DbgFlg {
    #[strum(serialize = "DBG_FLG_DB")]
    Db,
    #[strum(serialize = "DBG_FLG_ANALYSIS")]
    Analysis,
}

lazy_static! {
    pub static ref DBG_FLG_DEFAULTS: HashMap<DbgFlg, bool> =
        HashMap::from([(DbgFlg::Db, false), (DbgFlg::Analysis, false)]);
}

impl DbgFlg {
    fn target(&self) -> &'static str {
        match self {
            DbgFlg::Db => "deck_analysis::db",
            DbgFlg::Analysis => "deck_analysis::analysis",
        }
    }
}

/// Emits `s` at debug level when the flag's env var (or its default) enables it.
pub fn log_if(s: &str, flg: DbgFlg) {
    if checkflag(&flg) {
        log::debug!(target: flg.target(), "{}", s);
    }
}

pub fn checkflag(flag: &DbgFlg) -> bool {
    env::var(flag.to_string()).ok().map_or_else(
        || DBG_FLG_DEFAULTS.get(flag).copied().unwrap_or(false),
        |s| s == "1" || s == "true",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_names_match_env_vars() {
        assert_eq!(DbgFlg::Db.to_string(), "DBG_FLG_DB");
        assert_eq!(DbgFlg::Analysis.to_string(), "DBG_FLG_ANALYSIS");
    }

    #[test]
    fn test_defaults_cover_every_flag() {
        assert!(DBG_FLG_DEFAULTS.contains_key(&DbgFlg::Db));
        assert!(DBG_FLG_DEFAULTS.contains_key(&DbgFlg::Analysis));
    }
}
