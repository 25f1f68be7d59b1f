//! On-disk fixture for integration testing.
//!
//! Writes a small soccer and hockey data set into a uuid-named temp
//! directory and hands out an `AppConfig` pointing at it. The directory
//! is removed on drop.

use chrono::NaiveDate;
use std::path::PathBuf;

use edgeguard::config::{AppConfig, SportFiles};

pub const SOCCER_HISTORY: &str = "\
date,season,home_team,away_team,home_odds,draw_odds,away_odds,home_goals,away_goals,home_rest,away_rest
2025-03-01,2024,Arsenal,Wolves,1.50,4.00,6.00,2,0,7,7
2025-03-08,2024,Wolves,Chelsea,3.00,3.40,2.30,1,1,7,7
";

pub const SOCCER_LIVE: &str = "\
date,season,home_team,away_team,home_odds,draw_odds,away_odds,home_goals,away_goals,home_rest,away_rest
2025-03-15,2024,Arsenal,Chelsea,2.10,3.40,3.60,,,7,6
2025-03-15,2024,Wolves,Everton,2.50,3.20,2.90,,,7,7
";

pub const SOCCER_PREDICTIONS: &str = "\
date,home_team,away_team,p_home,p_draw,p_away
2025-03-15,Arsenal,Chelsea,0.55,0.25,0.20
2025-03-15,Wolves,Everton,0.40,0.31,0.29
";

pub const SOCCER_INJURIES: &str = "\
date,team,player,is_out,impact
2025-03-15,Chelsea,Striker,1,0.30
";

pub const HOCKEY_HISTORY: &str = "\
date,home_team,away_team,home_odds,away_odds,home_goals,away_goals,home_rest,away_rest
2025-01-04,Oilers,Flames,1.80,2.05,4,2,2,1
";

pub const HOCKEY_LIVE: &str = "\
date,home_team,away_team,home_odds,away_odds,home_rest,away_rest
2025-01-11,Oilers,Canucks,1.90,2.00,3,2
";

pub const HOCKEY_PREDICTIONS: &str = "\
date,home_team,away_team,p_home,p_draw,p_away
2025-01-11,Oilers,Canucks,0.62,,0.38
";

pub const HOCKEY_GOALIES: &str = "\
date,team,goalie,is_confirmed,goalie_rating
2025-01-11,Oilers,G1,1,0.915
2025-01-11,Canucks,G2,1,0.902
";

pub fn soccer_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
}

pub fn hockey_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 11).unwrap()
}

pub struct Fixture {
    pub dir: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let mut dir = std::env::temp_dir();
        dir.push(format!("edgeguard_it_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();

        let fixture = Self { dir };
        fixture.write("soccer_matches.csv", SOCCER_HISTORY);
        fixture.write("live_odds_soccer.csv", SOCCER_LIVE);
        fixture.write("predictions_soccer.csv", SOCCER_PREDICTIONS);
        fixture.write("soccer_injuries.csv", SOCCER_INJURIES);
        fixture.write("hockey_matches.csv", HOCKEY_HISTORY);
        fixture.write("live_odds_hockey.csv", HOCKEY_LIVE);
        fixture.write("predictions_hockey.csv", HOCKEY_PREDICTIONS);
        fixture.write("hockey_goalies.csv", HOCKEY_GOALIES);
        fixture
    }

    pub fn path(&self, name: &str) -> String {
        self.dir.join(name).to_string_lossy().to_string()
    }

    pub fn write(&self, name: &str, contents: &str) -> String {
        let path = self.path(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Default configuration with every path inside the fixture.
    pub fn config(&self) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.data.soccer = SportFiles {
            history: self.path("soccer_matches.csv"),
            live: self.path("live_odds_soccer.csv"),
            predictions: self.path("predictions_soccer.csv"),
            injuries: Some(self.path("soccer_injuries.csv")),
            goalies: None,
        };
        cfg.data.hockey = SportFiles {
            history: self.path("hockey_matches.csv"),
            live: self.path("live_odds_hockey.csv"),
            predictions: self.path("predictions_hockey.csv"),
            injuries: Some(self.path("hockey_injuries.csv")),
            goalies: Some(self.path("hockey_goalies.csv")),
        };
        cfg.safety.kill_switch_path = self.path("KILL_SWITCH");
        cfg.session.output_dir = self.path("out");
        cfg.session.state_file = self.path("out/daily_state.json");
        cfg
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}
