use crate::model::place::Place;

/// Result-count banner. Its presence anywhere in a reply routes it here.
pub const BANNER_PREFIX: &str = "Tìm thấy";
/// Closing question that follows the place list.
pub const PROMPT_PREFIX: &str = "Bạn muốn chọn";

pub const ADDRESS_PREFIX: &str = "Địa chỉ:";
pub const PHONE_PREFIX: &str = "Số điện thoại:";
pub const HOURS_PREFIX: &str = "Giờ mở cửa:";
pub const MAP_PREFIX: &str = "Bản đồ:";
pub const AI_MENU_PREFIX: &str = "AI Menu:";
pub const HIGHLIGHTS_PREFIX: &str = "Điểm nổi bật:";
pub const BULLET_PREFIX: &str = "-";

/// Closing prompt shown under a rendered place list.
pub const CLOSING_PROMPT: &str = "Bạn muốn chọn địa điểm nào?";

/// Banner shown above a rendered place list.
pub fn locations_banner(count: usize) -> String {
    format!("{BANNER_PREFIX} {count} địa điểm:")
}

/// Whether a raw reply should be parsed into places at all.
pub fn is_locations_reply(raw: &str) -> bool {
    raw.contains(BANNER_PREFIX)
}

#[derive(Clone, Copy)]
enum Field {
    Address,
    Phone,
    OpeningHours,
    MapLink,
    AiMenuLink,
}

#[derive(Clone, Copy)]
enum LineAction {
    Skip,
    SetField(Field),
    SectionMarker,
    Highlight,
}

/// Ordered prefix rules. A line matching none of them is a header line.
const RULES: &[(&str, LineAction)] = &[
    (BANNER_PREFIX, LineAction::Skip),
    (PROMPT_PREFIX, LineAction::Skip),
    (ADDRESS_PREFIX, LineAction::SetField(Field::Address)),
    (PHONE_PREFIX, LineAction::SetField(Field::Phone)),
    (HOURS_PREFIX, LineAction::SetField(Field::OpeningHours)),
    (MAP_PREFIX, LineAction::SetField(Field::MapLink)),
    (AI_MENU_PREFIX, LineAction::SetField(Field::AiMenuLink)),
    (HIGHLIGHTS_PREFIX, LineAction::SectionMarker),
    (BULLET_PREFIX, LineAction::Highlight),
];

fn classify(line: &str) -> Option<(&'static str, LineAction)> {
    RULES
        .iter()
        .find(|(prefix, _)| line.starts_with(prefix))
        .copied()
}

impl Field {
    fn assign(self, place: &mut Place, value: String) {
        let slot = match self {
            Field::Address => &mut place.address,
            Field::Phone => &mut place.phone,
            Field::OpeningHours => &mut place.opening_hours,
            Field::MapLink => &mut place.map_link,
            Field::AiMenuLink => &mut place.ai_menu_link,
        };
        *slot = Some(value);
    }
}

/// Parse a place-list reply into places, in order of appearance.
///
/// Best effort: field and bullet lines with no open place are dropped. Names
/// are not validated.
pub fn parse_places(raw: &str) -> Vec<Place> {
    let mut places = Vec::new();
    let mut current: Option<Place> = None;

    for line in raw.split('\n') {
        if line.trim().is_empty() {
            continue;
        }

        let Some((prefix, action)) = classify(line) else {
            if let Some(done) = current.take() {
                places.push(done);
            }
            current = Some(Place::named(line.trim()));
            continue;
        };

        let rest = line[prefix.len()..].trim();
        match (action, current.as_mut()) {
            (LineAction::Skip, _) | (LineAction::SectionMarker, _) => {}
            (LineAction::SetField(field), Some(place)) => field.assign(place, rest.to_string()),
            (LineAction::Highlight, Some(place)) => place.highlights.push(rest.to_string()),
            (_, None) => {
                tracing::debug!(line, "dropping reply line with no open place");
            }
        }
    }

    if let Some(done) = current {
        places.push(done);
    }

    places
}
