#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const LAYOFFS_CSV: &str = "\
company,location,industry,total_laid_off,percentage_laid_off,date,stage,country,funds_raised
Acme,Bengaluru,Retail,100,0.1,2022-11-03,IPO,India,500
Globex,Santiago,Finance,50,,2023-01-06,Series B,Chile,0
Initech,Bengaluru,Retail,,,2022-03-15,,India,12
Acme,Mumbai,Retail,20,0.05,2022-11-20,IPO,India,500
Hooli,Santiago,Food,0,,2022-06-01,Seed,Chile,40
Umbrella,Bengaluru,Finance,30,0.2,2022-03-02,Post-IPO,India,
Stark,Austin,Hardware,300,0.15,2022-11-10,IPO,United States,2400
";

pub const POWER_PLANTS_CSV: &str = "\
country_long,country code,name of powerplant,primary_fuel,capacity in MW,start_year
Indonesia,IDN,Suralaya,Coal,4025,1985
Indonesia,IDN,Paiton,Coal,4710,1994
Chile,CHL,Ralco,Hydro,690,2004
Indonesia,IDN,Saguling,Hydro,700.7,1985
Chile,CHL,Pangue,Hydro,467,
Indonesia,IDN,Cirata,Hydro,1008,1988
";

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

pub fn write_layoffs_csv(dir: &Path) -> PathBuf {
    write_file(dir, "layoffs.csv", LAYOFFS_CSV)
}

pub fn write_power_plants_csv(dir: &Path) -> PathBuf {
    write_file(dir, "power_plant.csv", POWER_PLANTS_CSV)
}
