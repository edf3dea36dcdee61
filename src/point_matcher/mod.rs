mod distance;
mod matcher_types;
mod nearest_matcher;
mod normalizer;

pub use self::distance::{geodesic_distance_km, round_distance, DISTANCE_DECIMALS};
pub use self::matcher_types::{
    Assignment, MatchResult, MatchStats, MatcherError, Point, PointSet, RawTable, Role,
    ASSIGNMENT_COLUMNS,
};
pub use self::nearest_matcher::{match_points, match_points_with_progress};
pub use self::normalizer::{normalize, ColumnMapping, NormalizedTable};
