// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Instrument family membership tables.

pub const KEYBOARDS_FAMILY_SET: &[&str] = &["keyboards", "organs", "synths"];

pub const STRINGS_FAMILY_SET: &[&str] = &[
    "harps",
    "guitars",
    "bass-guitars",
    "banjos",
    "ukuleles",
    "mandolins",
    "mtn-dulcimers",
    "lutes",
    "balalaikas",
    "bouzoukis",
    "kotos",
    "ouds",
    "shamisens",
    "sitars",
    "tamburicas",
    "bandurrias",
    "lauds",
    "strings",
    "orchestral-strings",
    "viols",
    "octobasses",
    "erhus",
    "nyckelharpas",
];

pub const WINDS_FAMILY_SET: &[&str] = &[
    "winds",
    "flutes",
    "dizis",
    "shakuhachis",
    "fifes",
    "whistles",
    "flageolets",
    "recorders",
    "ocarinas",
    "gemshorns",
    "pan-flutes",
    "quenas",
    "oboes",
    "shawms",
    "cromornes",
    "crumhorns",
    "cornamuses",
    "kelhorns",
    "rauschpfeifes",
    "duduks",
    "shenais",
    "clarinets",
    "chalumeaus",
    "xaphoons",
    "tarogatos",
    "octavins",
    "saxophones",
    "bassoons",
    "reed-contrabasses",
    "dulcians",
    "racketts",
    "sarrusophones",
    "bagpipes",
    "accordions",
    "harmonicas",
    "melodicas",
    "shengs",
    "brass",
    "horns",
    "wagner-tubas",
    "cornets",
    "saxhorns",
    "alto-horns",
    "baritone-horns",
    "posthorns",
    "trumpets",
    "baroque-trumpets",
    "bugles",
    "flugelhorns",
    "ophicleides",
    "cornetts",
    "serpents",
    "trombones",
    "sackbuts",
    "euphoniums",
    "tubas",
    "sousaphones",
    "conches",
    "alphorns",
    "rag-dungs",
    "didgeridoos",
    "shofars",
    "vuvuzelas",
    "klaxon-horns",
    "kazoos",
];

pub const PERCUSSION_FAMILY_SET: &[&str] = &[
    "timpani",
    "roto-toms",
    "tubaphones",
    "steel-drums",
    "keyboard-percussion",
    "pitched-metal-percussion",
    "orff-percussion",
    "flexatones",
    "musical-saws",
    "glass-percussion",
    "kalimbas",
    "drums",
    "unpitched-metal-percussion",
    "unpitched-wooden-percussion",
    "other-percussion",
    "batterie",
    "body-percussion",
];
