use std::fmt;

/// Every collection the data directory can hold.
///
/// The kind decides the file name and which fields are timestamps that must
/// be rehydrated when the file is read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Users,
    Teams,
    TeamMembers,
    Matches,
    Events,
    Announcements,
    Invitations,
    MatchLineups,
    TeamLineups,
    LeagueClassification,
    MatchPhotos,
    Attendance,
    PlayerStats,
    MatchSubstitutions,
    MatchGoals,
    MatchCards,
}

impl EntityKind {
    pub const ALL: [EntityKind; 16] = [
        Self::Users,
        Self::Teams,
        Self::TeamMembers,
        Self::Matches,
        Self::Events,
        Self::Announcements,
        Self::Invitations,
        Self::MatchLineups,
        Self::TeamLineups,
        Self::LeagueClassification,
        Self::MatchPhotos,
        Self::Attendance,
        Self::PlayerStats,
        Self::MatchSubstitutions,
        Self::MatchGoals,
        Self::MatchCards,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Teams => "teams",
            Self::TeamMembers => "team_members",
            Self::Matches => "matches",
            Self::Events => "events",
            Self::Announcements => "announcements",
            Self::Invitations => "invitations",
            Self::MatchLineups => "match_lineups",
            Self::TeamLineups => "team_lineups",
            Self::LeagueClassification => "league_classification",
            Self::MatchPhotos => "match_photos",
            Self::Attendance => "attendance",
            Self::PlayerStats => "player_stats",
            Self::MatchSubstitutions => "match_substitutions",
            Self::MatchGoals => "match_goals",
            Self::MatchCards => "match_cards",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.json", self.name())
    }

    /// Fields stored as ISO-8601 text that are parsed back into timestamps on load.
    pub fn date_fields(self) -> &'static [&'static str] {
        match self {
            Self::TeamMembers => &["joined_at"],
            Self::Matches => &["match_date"],
            Self::Events => &["start_time", "end_time"],
            Self::Announcements | Self::Invitations | Self::MatchLineups => &["created_at"],
            Self::TeamLineups | Self::LeagueClassification => &["created_at", "updated_at"],
            Self::MatchPhotos => &["uploaded_at"],
            Self::Users
            | Self::Teams
            | Self::Attendance
            | Self::PlayerStats
            | Self::MatchSubstitutions
            | Self::MatchGoals
            | Self::MatchCards => &[],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
