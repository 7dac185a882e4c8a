//! Interactive menu for the generate tool.
//!
//! Lets users pick a profile and a reference location with `dialoguer`
//! prompts instead of CLI flags.

use coastal_hazard_cli_utils::{IndicatifProgress, MultiProgress};
use coastal_hazard_config::profiles;
use coastal_hazard_models::{LatLon, SafeSpotOutcome};
use dialoguer::{Confirm, Input, Select};

use crate::{RunArgs, configured_reference, resolve_config};

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if user input fails or the chosen action fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let choices = &[
        "Run full pipeline and export",
        "Find safe spots near a location",
        "List profiles",
    ];

    let selection = Select::new()
        .with_prompt("What would you like to do?")
        .items(choices)
        .default(0)
        .interact()?;

    match selection {
        0 => {
            let profile = select_profile()?;
            let reference = prompt_reference(&profile)?;
            let offline = prompt_offline()?;
            let args = RunArgs {
                profile: Some(profile),
                reference: Some(reference),
                offline,
                ..RunArgs::default()
            };
            let progress = IndicatifProgress::batch_bar(multi, "Elevations");
            let manifest = crate::run(&args, progress).await?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
        1 => {
            let profile = select_profile()?;
            let reference = prompt_reference(&profile)?;
            let offline = prompt_offline()?;
            let progress = IndicatifProgress::batch_bar(multi, "Elevations");
            let outcome =
                crate::safe_spots(reference, None, Some(&profile), None, offline, progress)
                    .await?;
            print_outcome(&outcome);
        }
        2 => print_profiles(),
        _ => unreachable!(),
    }

    Ok(())
}

fn select_profile() -> Result<String, Box<dyn std::error::Error>> {
    let names = profiles::profile_names();
    let selection = Select::new()
        .with_prompt("Profile")
        .items(&names)
        .default(0)
        .interact()?;
    Ok(names[selection].to_string())
}

fn prompt_reference(profile: &str) -> Result<LatLon, Box<dyn std::error::Error>> {
    let default = configured_reference(&resolve_config(Some(profile), None)?);

    let latitude: f64 = Input::new()
        .with_prompt("Reference latitude")
        .default(default.latitude)
        .interact_text()?;
    let longitude: f64 = Input::new()
        .with_prompt("Reference longitude")
        .default(default.longitude)
        .interact_text()?;

    Ok(LatLon::new(latitude, longitude))
}

fn prompt_offline() -> Result<bool, Box<dyn std::error::Error>> {
    Ok(Confirm::new()
        .with_prompt("Simulate elevations (offline)?")
        .default(false)
        .interact()?)
}

/// Prints every embedded profile with its hotspot policy.
pub fn print_profiles() {
    for config in profiles::all_profiles() {
        println!(
            "{:<10} k={} z>{} reports>={}  {}",
            config.name,
            config.hotspot.k_neighbors,
            config.hotspot.z_threshold,
            config.hotspot.min_reports,
            config.description
        );
    }
}

/// Prints a safe-spot outcome as a short table.
pub fn print_outcome(outcome: &SafeSpotOutcome) {
    match outcome {
        SafeSpotOutcome::AlreadySafe {
            elevation_meters,
            tsunami_height_meters,
            ..
        } => {
            println!(
                "Already safe: {elevation_meters:.1} m is above the {tsunami_height_meters:.1} m run-up height"
            );
        }
        SafeSpotOutcome::Searched {
            required_elevation_meters,
            candidates_sampled,
            spots,
            ..
        } => {
            println!(
                "{} of {candidates_sampled} candidates above {required_elevation_meters:.1} m",
                spots.len()
            );
            for (rank, spot) in (1..).zip(spots) {
                println!(
                    "{rank:>3}. ({:.5}, {:.5}) {:>6.1} m  {:>5.2} km  score {:.0}",
                    spot.latitude,
                    spot.longitude,
                    spot.elevation_meters,
                    spot.distance_from_reference_km,
                    spot.safety_score
                );
            }
        }
    }
}
