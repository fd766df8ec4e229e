// SPDX-License-Identifier: AGPL-3.0
// SimCar CLI - Command handlers
//
// Handlers call into simcar-core and render plain text for the shell.

use crate::shell::{
    ConfigAction, FavAction, ProfileAction, SearchAction, SellAction, ShellCommand,
};
use crate::state::AppState;
use simcar_core::{
    filter_listings, Credentials, FavoriteAction, FavoriteState, FilterCriteria,
    Listing, ListingDraft, ProfileUpdate, SignUpRequest, ToggleOutcome,
};
use std::fmt::Write as _;
use std::path::Path;

type CommandResult<T> = Result<T, String>;

fn login_prompt() -> String {
    "Login required: log in with `login <email> <password>`".to_string()
}

/// Run one parsed shell command. `Quit` is handled by the caller.
pub async fn execute(state: &AppState, command: ShellCommand) -> CommandResult<String> {
    match command {
        ShellCommand::Cars { refresh } => list_cars(state, refresh).await,
        ShellCommand::Car { id } => show_car(state, id).await,
        ShellCommand::Diagnose { id } => diagnose(state, id).await,
        ShellCommand::Search { action } => Ok(search(state, action)),
        ShellCommand::Fav { action } => match action {
            FavAction::Show { id } => show_favorite(state, id).await,
            FavAction::Toggle { id } => toggle_favorite(state, id).await,
        },
        ShellCommand::Favorites => list_favorites(state).await,
        ShellCommand::Login { email, password } => login(state, email, password).await,
        ShellCommand::Logout => logout(state).await,
        ShellCommand::Join {
            email,
            password,
            name,
            phone,
        } => join(state, email, password, name, phone).await,
        ShellCommand::Profile { action } => profile(state, action).await,
        ShellCommand::Sales => sales(state).await,
        ShellCommand::Sell { action } => sell(state, action).await,
        ShellCommand::Config { action } => config(state, action),
        ShellCommand::Quit => Ok(String::new()),
    }
}

fn require_login(state: &AppState) -> CommandResult<()> {
    if state.is_logged_in() {
        Ok(())
    } else {
        Err(login_prompt())
    }
}

/// List the cached listing set through the current criteria
async fn list_cars(state: &AppState, refresh: bool) -> CommandResult<String> {
    if refresh || state.listings().is_empty() {
        let listings = state.client.list_cars().await.map_err(|e| e.to_string())?;
        state.replace_listings(listings);
    }

    let listings = state.listings();
    let criteria = state.criteria();
    let matched = filter_listings(&listings, &criteria);

    if matched.is_empty() {
        return Ok("No listings match the current search.".to_string());
    }

    let mut out = String::new();
    for listing in &matched {
        let _ = writeln!(out, "{}", render_row(listing));
    }
    let _ = write!(out, "{} of {} listings", matched.len(), listings.len());
    Ok(out)
}

async fn show_car(state: &AppState, id: i64) -> CommandResult<String> {
    let listing = state.client.get_car(id).await.map_err(|e| e.to_string())?;

    // The favorite list is only fetched for logged-in members; a failure here
    // should not hide the listing itself.
    let favorite = match state.favorites.load(id, state.is_logged_in()).await {
        Ok(favorite) => favorite,
        Err(e) => {
            tracing::warn!("Could not load favorite state for {}: {}", id, e);
            FavoriteState::NotFavorite
        }
    };

    Ok(render_detail(&listing, favorite, state.client.base_url()))
}

async fn diagnose(state: &AppState, id: i64) -> CommandResult<String> {
    let diagnosis = state.client.diagnose_car(id).await.map_err(|e| e.to_string())?;
    Ok(format!(
        "Reliability score: {}\n{}",
        diagnosis.reliability_score, diagnosis.evaluation_comment
    ))
}

fn search(state: &AppState, action: SearchAction) -> String {
    match action {
        SearchAction::Show => {}
        SearchAction::Clear => state.update_criteria(|c| *c = FilterCriteria::default()),
        SearchAction::Set(args) => state.update_criteria(|c| args.apply_to(c)),
        SearchAction::Unset { fields } => state.update_criteria(|c| {
            for field in fields {
                field.clear(c);
            }
        }),
    }
    render_criteria(&state.criteria())
}

async fn show_favorite(state: &AppState, id: i64) -> CommandResult<String> {
    let favorite = state
        .favorites
        .load(id, state.is_logged_in())
        .await
        .map_err(|e| e.to_string())?;
    Ok(format!("{} {}", heart(favorite), id))
}

async fn toggle_favorite(state: &AppState, id: i64) -> CommandResult<String> {
    if state.favorites.state(id).await == FavoriteState::Unknown && state.is_logged_in() {
        state
            .favorites
            .load(id, true)
            .await
            .map_err(|e| e.to_string())?;
    }

    match state.favorites.toggle(id, state.is_logged_in()).await {
        ToggleOutcome::LoginRequired => Err(login_prompt()),
        ToggleOutcome::Applied { action, state: favorite } => Ok(match action {
            FavoriteAction::AddFavorite(_) => {
                format!("{} Added listing {} to your favorites", heart(favorite), id)
            }
            _ => format!("{} Removed listing {} from your favorites", heart(favorite), id),
        }),
        ToggleOutcome::Failed {
            action,
            state: favorite,
            error,
        } => {
            let what = match action {
                FavoriteAction::AddFavorite(_) => "Adding favorite",
                _ => "Removing favorite",
            };
            Err(format!("{} failed: {} ({} {})", what, error, heart(favorite), id))
        }
    }
}

async fn list_favorites(state: &AppState) -> CommandResult<String> {
    require_login(state)?;
    let favorites = state.favorites.refresh().await.map_err(|e| e.to_string())?;
    Ok(render_list(&favorites, "You have no favorite listings."))
}

async fn login(state: &AppState, email: String, password: String) -> CommandResult<String> {
    let credentials = Credentials { email, password };
    // A failed attempt leaves any earlier session and its cookie in place
    state
        .client
        .login(&credentials)
        .await
        .map_err(|e| format!("Login failed: {}", e))?;
    state.set_logged_in(true).await;
    Ok(format!("Logged in as {}", credentials.email))
}

async fn logout(state: &AppState) -> CommandResult<String> {
    require_login(state)?;
    state.client.logout().await.map_err(|e| e.to_string())?;
    state.set_logged_in(false).await;
    Ok("Logged out".to_string())
}

async fn join(
    state: &AppState,
    email: String,
    password: String,
    name: String,
    phone: String,
) -> CommandResult<String> {
    let request = SignUpRequest {
        email,
        password,
        name,
        phone,
    };
    state
        .client
        .join(&request)
        .await
        .map_err(|e| format!("Sign-up failed: {}", e))?;
    Ok(format!("Account created for {}. You can log in now.", request.email))
}

async fn profile(state: &AppState, action: ProfileAction) -> CommandResult<String> {
    require_login(state)?;
    match action {
        ProfileAction::Show => {
            let profile = state.client.profile().await.map_err(|e| e.to_string())?;
            Ok(format!(
                "Email: {}\nName:  {}\nPhone: {}",
                profile.email, profile.name, profile.phone
            ))
        }
        ProfileAction::Edit {
            name,
            phone,
            password,
        } => {
            let update = ProfileUpdate {
                name,
                phone,
                password,
            };
            state
                .client
                .update_profile(&update)
                .await
                .map_err(|e| e.to_string())?;
            Ok("Profile updated".to_string())
        }
        ProfileAction::Delete => {
            state
                .client
                .delete_account()
                .await
                .map_err(|e| format!("Account deletion failed: {}", e))?;
            state.set_logged_in(false).await;
            Ok("Account deleted".to_string())
        }
    }
}

async fn sales(state: &AppState) -> CommandResult<String> {
    require_login(state)?;
    let listings = state.client.sales().await.map_err(|e| e.to_string())?;
    Ok(render_list(&listings, "You have no listings for sale."))
}

async fn sell(state: &AppState, action: SellAction) -> CommandResult<String> {
    require_login(state)?;
    match action {
        SellAction::Register { draft } => {
            let draft = read_draft(&draft).await?;
            state
                .client
                .register_car(&draft)
                .await
                .map_err(|e| format!("Registration failed: {}", e))?;
            Ok(format!("Registered {} {}", draft.brand, draft.model))
        }
        SellAction::Edit { id, draft } => {
            let draft = read_draft(&draft).await?;
            state
                .client
                .update_car(id, &draft)
                .await
                .map_err(|e| format!("Update failed: {}", e))?;
            Ok(format!("Listing {} updated", id))
        }
        SellAction::Delete { id } => {
            state
                .client
                .delete_car(id)
                .await
                .map_err(|e| format!("Deletion failed: {}", e))?;
            Ok(format!("Listing {} deleted", id))
        }
    }
}

fn config(state: &AppState, action: ConfigAction) -> CommandResult<String> {
    let mut settings = state.settings.get();
    match action {
        ConfigAction::Show => {
            return Ok(format!(
                "API base URL:   {}\nNewest first:   {}\nConnect timeout: {}s\nRequest timeout: {}s\nSettings file:  {}",
                settings.api_base_url,
                settings.newest_first,
                settings.connect_timeout_secs,
                settings.request_timeout_secs,
                state.settings.path().display()
            ));
        }
        ConfigAction::SetUrl { url } => settings.api_base_url = url,
        ConfigAction::NewestFirst { enabled } => settings.newest_first = enabled,
    }
    state.settings.update(settings).map_err(|e| e.to_string())?;
    Ok("Settings saved; restart simcar to apply them.".to_string())
}

async fn read_draft(path: &Path) -> CommandResult<ListingDraft> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Invalid listing draft: {}", e))
}

fn heart(state: FavoriteState) -> &'static str {
    if state.is_favorite() {
        "♥"
    } else {
        "♡"
    }
}

/// Whole-unit price with thousands separators, e.g. "15,000,000 원"
pub fn format_price(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if price < 0 { "-" } else { "" };
    format!("{}{} 원", sign, grouped)
}

/// One line per listing: id, title and the summary shown in the browse list
pub fn render_row(listing: &Listing) -> String {
    format!(
        "{:>5}  {}  {} · {} · {} · {}",
        listing.id,
        listing.title(),
        listing.year,
        listing.car_type,
        listing.region.as_deref().unwrap_or("n/a"),
        format_price(listing.price)
    )
}

fn render_list(listings: &[Listing], empty: &str) -> String {
    if listings.is_empty() {
        return empty.to_string();
    }
    listings
        .iter()
        .map(render_row)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_detail(listing: &Listing, favorite: FavoriteState, base_url: &str) -> String {
    fn or_na(value: Option<&str>) -> &str {
        value.unwrap_or("n/a")
    }

    let mut out = format!("{} {}\n", heart(favorite), listing.title());
    let _ = writeln!(out, "  Price:        {}", format_price(listing.price));
    let _ = writeln!(out, "  Year:         {}", listing.year);
    let _ = writeln!(out, "  Type:         {}", listing.car_type);
    let _ = writeln!(
        out,
        "  Mileage:      {}",
        listing
            .mileage
            .map(|m| format!("{} km", m))
            .unwrap_or_else(|| "n/a".to_string())
    );
    let _ = writeln!(out, "  Fuel:         {}", or_na(listing.fuel_type.as_deref()));
    let _ = writeln!(out, "  Transmission: {}", or_na(listing.transmission.as_deref()));
    let _ = writeln!(out, "  Color:        {}", or_na(listing.color.as_deref()));
    let _ = writeln!(out, "  Car number:   {}", or_na(listing.car_number.as_deref()));
    let _ = writeln!(out, "  Region:       {}", or_na(listing.region.as_deref()));
    let _ = writeln!(out, "  Seller:       {}", or_na(listing.seller_name.as_deref()));
    let _ = writeln!(out, "  Contact:      {}", or_na(listing.contact_number.as_deref()));
    if let Some(url) = listing.full_image_url(base_url) {
        let _ = writeln!(out, "  Image:        {}", url);
    }
    out.truncate(out.trim_end().len());
    out
}

pub fn render_criteria(criteria: &FilterCriteria) -> String {
    if criteria.is_unfiltered() {
        return "No search criteria set; all listings are shown.".to_string();
    }

    let mut parts = Vec::new();
    for (label, value) in [
        ("manufacturer", &criteria.manufacturer),
        ("model", &criteria.model),
        ("year", &criteria.year),
        ("type", &criteria.car_type),
        ("region", &criteria.region),
        ("fuel", &criteria.fuel_type),
    ] {
        if !value.is_empty() {
            parts.push(format!("{}={}", label, value));
        }
    }
    if criteria.has_price_limit() {
        parts.push(format!("max price={}", format_price(criteria.max_price)));
    }
    if let Some(limit) = criteria.max_mileage {
        parts.push(format!("max mileage={} km", limit));
    }
    format!("Search: {}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::SearchField;
    use simcar_core::{AppSettings, SettingsStore};

    fn listing() -> Listing {
        serde_json::from_value(serde_json::json!({
            "id": 2,
            "type": "Compact",
            "brand": "Kia",
            "model": "Morning",
            "year": 2019,
            "price": 9000000,
            "region": "Busan",
            "imageUrl": "/img/2.jpg"
        }))
        .unwrap()
    }

    fn offline_state() -> AppState {
        let path = std::env::temp_dir()
            .join(format!("simcar-cli-{}", uuid::Uuid::new_v4()))
            .join("settings.json");
        let settings = SettingsStore::with_path(path).unwrap();
        // Nothing listens on port 9; requests made by mistake fail fast.
        AppState::with_settings(settings, Some("http://127.0.0.1:9/api".to_string())).unwrap()
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0), "0 원");
        assert_eq!(format_price(950), "950 원");
        assert_eq!(format_price(15_000_000), "15,000,000 원");
        assert_eq!(format_price(-1_000), "-1,000 원");
    }

    #[test]
    fn test_render_row() {
        assert_eq!(
            render_row(&listing()),
            "    2  Kia Morning  2019 · Compact · Busan · 9,000,000 원"
        );
    }

    #[test]
    fn test_render_detail_marks_favorite() {
        let detail = render_detail(&listing(), FavoriteState::Favorite, "http://host:8080/api");
        assert!(detail.starts_with("♥ Kia Morning"));
        assert!(detail.contains("Image:        http://host:8080/img/2.jpg"));
        assert!(detail.contains("Mileage:      n/a"));

        let detail = render_detail(&listing(), FavoriteState::NotFavorite, "http://host:8080/api");
        assert!(detail.starts_with("♡"));
    }

    #[test]
    fn test_render_criteria() {
        assert!(render_criteria(&FilterCriteria::default()).starts_with("No search criteria"));

        let criteria = FilterCriteria {
            manufacturer: "kia".to_string(),
            max_price: 10_000_000,
            ..FilterCriteria::default()
        };
        assert_eq!(
            render_criteria(&criteria),
            "Search: manufacturer=kia, max price=10,000,000 원"
        );
    }

    #[tokio::test]
    async fn test_logged_out_toggle_prompts_for_login() {
        let state = offline_state();
        let result = execute(&state, ShellCommand::Fav { action: FavAction::Toggle { id: 5 } }).await;
        assert_eq!(result, Err(login_prompt()));
    }

    #[tokio::test]
    async fn test_member_commands_require_login() {
        let state = offline_state();
        assert!(execute(&state, ShellCommand::Favorites).await.is_err());
        assert!(execute(&state, ShellCommand::Sales).await.is_err());
        assert!(execute(&state, ShellCommand::Logout).await.is_err());
    }

    #[tokio::test]
    async fn test_search_filters_cached_listings() {
        let state = offline_state();
        let mut other = listing();
        other.id = 1;
        other.brand = "Hyundai".to_string();
        other.price = 15_000_000;
        state.replace_listings(vec![other, listing()]);

        let out = execute(
            &state,
            ShellCommand::Search {
                action: SearchAction::Set(crate::shell::SearchArgs {
                    max_price: Some(10_000_000),
                    ..Default::default()
                }),
            },
        )
        .await
        .unwrap();
        assert_eq!(out, "Search: max price=10,000,000 원");

        let out = execute(&state, ShellCommand::Cars { refresh: false }).await.unwrap();
        assert!(out.contains("Kia Morning"));
        assert!(!out.contains("Hyundai"));
        assert!(out.ends_with("1 of 2 listings"));
    }

    #[tokio::test]
    async fn test_search_unset_clears_single_criteria() {
        let state = offline_state();
        state.update_criteria(|c| {
            c.manufacturer = "kia".to_string();
            c.region = "Busan".to_string();
            c.max_mileage = Some(50_000);
        });

        let out = execute(
            &state,
            ShellCommand::Search {
                action: SearchAction::Unset {
                    fields: vec![SearchField::Region, SearchField::MaxMileage],
                },
            },
        )
        .await
        .unwrap();
        assert_eq!(out, "Search: manufacturer=kia");
        assert_eq!(state.criteria().max_mileage, None);
    }

    #[tokio::test]
    async fn test_failed_login_keeps_existing_session() {
        let state = offline_state();
        state.set_logged_in(true).await;

        let result = execute(
            &state,
            ShellCommand::Login {
                email: "kim@simcar.kr".to_string(),
                password: "wrong".to_string(),
            },
        )
        .await;
        assert!(result.unwrap_err().starts_with("Login failed"));
        assert!(state.is_logged_in());
    }

    #[tokio::test]
    async fn test_config_update_persists() {
        let state = offline_state();
        execute(
            &state,
            ShellCommand::Config {
                action: ConfigAction::NewestFirst { enabled: false },
            },
        )
        .await
        .unwrap();
        assert!(!state.settings.get().newest_first);
        assert_eq!(state.settings.get().api_base_url, AppSettings::default().api_base_url);
    }
}
