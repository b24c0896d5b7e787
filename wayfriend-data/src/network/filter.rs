//! Tag filters deciding which OSM ways belong to the walking network.

/// `highway` values that never carry pedestrians.
const EXCLUDED_HIGHWAYS: [&str; 8] = [
    "motorway",
    "motorway_link",
    "construction",
    "proposed",
    "abandoned",
    "raceway",
    "bus_guideway",
    "platform",
];

/// Classification of a way's tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct HighwayTags {
    /// Value of the `highway` tag.
    pub(super) highway: String,
    /// Whether the way passes the pedestrian filter.
    pub(super) walkable: bool,
}

/// Classify a way by its tags, returning `None` when it is not a highway.
pub(super) fn classify_way<'a, I>(tags: I) -> Option<HighwayTags>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut highway = None;
    let mut foot_forbidden = false;
    let mut access_forbidden = false;
    for (key, value) in tags {
        match key {
            "highway" => highway = Some(value),
            "foot" => foot_forbidden = value == "no",
            "access" => access_forbidden = matches!(value, "private" | "no"),
            _ => {}
        }
    }
    let highway = highway?;
    let walkable =
        !EXCLUDED_HIGHWAYS.contains(&highway) && !foot_forbidden && !access_forbidden;
    Some(HighwayTags {
        highway: highway.to_owned(),
        walkable,
    })
}
