//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::{board::PointsTarget, rally::Players};

/// Longest accepted player name, in characters.
pub const PLAYER_NAME_MAX_LEN: usize = 40;

/// Validates that every name slot fits on the board.
///
/// Blank names are allowed here; the readiness check refuses to start a rally
/// until all four are filled in.
///
/// # Examples
///
/// ```ignore
/// validate_players(&Players { a: ["Ann".into(), "".into()], b: Default::default() }) // Ok
/// ```
pub fn validate_players(players: &Players) -> Result<(), ValidationError> {
    let too_long = players
        .a
        .iter()
        .chain(players.b.iter())
        .find(|name| name.chars().count() > PLAYER_NAME_MAX_LEN);

    if let Some(name) = too_long {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!(
                "Player names must be at most {PLAYER_NAME_MAX_LEN} characters (got {})",
                name.chars().count()
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that the requested game length is supported (11 or 15).
pub fn validate_points_target(points: u32) -> Result<(), ValidationError> {
    PointsTarget::try_from(points).map(|_| ()).map_err(|unsupported| {
        let mut err = ValidationError::new("points_to_win");
        err.message = Some(unsupported.to_string().into());
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players(name: &str) -> Players {
        Players {
            a: [name.to_string(), "Abe".into()],
            b: ["Bea".into(), String::new()],
        }
    }

    #[test]
    fn test_validate_players_accepts_short_and_blank_names() {
        assert!(validate_players(&players("Ann")).is_ok());
        assert!(validate_players(&players("")).is_ok());
        assert!(validate_players(&players(&"é".repeat(PLAYER_NAME_MAX_LEN))).is_ok());
    }

    #[test]
    fn test_validate_players_rejects_long_names() {
        let err = validate_players(&players(&"x".repeat(PLAYER_NAME_MAX_LEN + 1))).unwrap_err();
        assert_eq!(err.code, "player_name_length");
    }

    #[test]
    fn test_validate_points_target() {
        assert!(validate_points_target(11).is_ok());
        assert!(validate_points_target(15).is_ok());
        assert!(validate_points_target(21).is_err());
        assert!(validate_points_target(0).is_err());
    }
}
