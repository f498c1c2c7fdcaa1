use std::{path::PathBuf, sync::Arc};

use super::{HeuristicProfile, HeuristicScanner};
use crate::{data::Platform, system::registry::RegistryReader};

// UBISOFT ------------------------------------------------------------------------------
static UBISOFT_PROFILE: HeuristicProfile = HeuristicProfile {
    platform: Platform::Ubisoft,
    default_folders: &[
        "Ubisoft/Ubisoft Game Launcher/games",
        "Ubisoft Game Launcher/games",
    ],
    registry_roots: &[
        "HKLM\\SOFTWARE\\Ubisoft\\Launcher\\Installs",
        "HKLM\\SOFTWARE\\WOW6432Node\\Ubisoft\\Launcher\\Installs",
        "HKLM\\SOFTWARE\\Ubisoft",
        "HKLM\\SOFTWARE\\WOW6432Node\\Ubisoft",
    ],
    install_value_names: &["installdir"],
    search_folders: &[
        "Juegos",
        "Games",
        "Ubisoft Games",
        "Ubisoft",
        "Program Files/Ubisoft",
        "Program Files (x86)/Ubisoft",
        "Program Files/Ubisoft/Ubisoft Game Launcher/games",
        "Program Files (x86)/Ubisoft/Ubisoft Game Launcher/games",
    ],
    keywords: &[
        "assassin",
        "creed",
        "far cry",
        "farcry",
        "watch dogs",
        "watchdogs",
        "rainbow six",
        "r6",
        "siege",
        "division",
        "ghost recon",
        "splinter cell",
        "rayman",
        "prince of persia",
        "beyond good",
        "anno",
        "settlers",
        "crew",
        "steep",
        "for honor",
        "skull and bones",
        "immortals",
        "fenyx",
        "avatar",
        "riders republic",
        "xdefiant",
        "just dance",
        "trials",
        "trackmania",
        "scott pilgrim",
        "south park",
        "mario rabbids",
        "rabbids",
        "child of light",
        "valiant hearts",
    ],
    invalid_names: &[
        "launcher",
        "installs",
        "ubisoft",
        "uplay",
        "overlay",
        "connect",
        "settings",
        "cache",
    ],
    excluded_fragments: &[],
    min_name_len: 3,
};

impl HeuristicScanner {
    /// Scanner for games installed through Ubisoft Connect
    pub fn new_ubisoft(program_files: &[PathBuf], registry: Arc<dyn RegistryReader>) -> Self {
        HeuristicScanner::new(&UBISOFT_PROFILE, program_files, registry)
    }
}
