use std::{path::PathBuf, sync::Arc};

use super::{HeuristicProfile, HeuristicScanner};
use crate::{data::Platform, system::registry::RegistryReader};

// EA -----------------------------------------------------------------------------------
static EA_PROFILE: HeuristicProfile = HeuristicProfile {
    platform: Platform::Ea,
    default_folders: &["EA Games", "Origin Games"],
    registry_roots: &[
        "HKLM\\SOFTWARE\\EA Games",
        "HKLM\\SOFTWARE\\WOW6432Node\\EA Games",
        "HKLM\\SOFTWARE\\Electronic Arts",
        "HKLM\\SOFTWARE\\WOW6432Node\\Electronic Arts",
    ],
    install_value_names: &["installdir"],
    search_folders: &[
        "Juegos",
        "Games",
        "EA Games",
        "Electronic Arts",
        "Origin Games",
        "Program Files/EA Games",
        "Program Files/Electronic Arts",
        "Program Files/Origin Games",
        "Program Files (x86)/EA Games",
        "Program Files (x86)/Electronic Arts",
        "Program Files (x86)/Origin Games",
    ],
    keywords: &[
        "battlefield",
        "bf6",
        "bf5",
        "bf4",
        "bf3",
        "bf2",
        "bf1",
        "fifa",
        "fc 24",
        "fc 25",
        "fc 26",
        "ea sports fc",
        "apex",
        "need for speed",
        "nfs",
        "mass effect",
        "dragon age",
        "dead space",
        "star wars",
        "jedi",
        "sims",
        "command conquer",
        "plants vs zombies",
        "it takes two",
        "a way out",
        "titanfall",
        "crysis",
        "burnout",
        "skate",
        "medal of honor",
        "mirrors edge",
        "anthem",
        "wild hearts",
        "garden warfare",
    ],
    invalid_names: &[
        "ea games",
        "electronic arts",
        "ea desktop",
        "ea app",
        "origin",
    ],
    excluded_fragments: &["ea core"],
    min_name_len: 3,
};

impl HeuristicScanner {
    /// Scanner for games installed through the EA app (or Origin before it)
    pub fn new_ea(program_files: &[PathBuf], registry: Arc<dyn RegistryReader>) -> Self {
        HeuristicScanner::new(&EA_PROFILE, program_files, registry)
    }
}
