//! Built-in fallback dataset, used when nothing has been loaded yet.
//!
//! Illustrative figures only: one row per country with three year columns,
//! a region and an average score, in the same layout a combined upload uses.

pub const SAMPLE_CSV: &str = "\
Country,Region,2018,2019,2020,Average_IQ
United States,Americas,62997,65120,63544,97.4
Canada,Americas,46549,46374,43294,99.5
Brazil,Americas,9151,8897,6797,83.4
Mexico,Americas,9687,9946,8655,87.6
Argentina,Americas,11633,9912,8579,92.8
Chile,Americas,15888,14631,13094,88.6
United Kingdom,Europe,43306,42747,40318,99.1
Germany,Europe,47939,46794,46208,100.7
France,Europe,41557,40494,39055,98.2
Italy,Europe,34622,33674,31918,96.6
Spain,Europe,30379,29600,27063,96.3
Poland,Europe,15468,15732,15764,96.1
Sweden,Europe,54589,51939,52838,98.8
Japan,Asia,39159,40247,39918,106.5
South Korea,Asia,33423,31902,31721,104.6
China,Asia,9977,10217,10500,104.1
India,Asia,2005,2100,1913,76.2
Indonesia,Asia,3894,4135,3870,78.5
Vietnam,Asia,2567,2715,2786,89.5
Thailand,Asia,7296,7817,7002,88.9
Australia,Oceania,57274,54875,51693,99.2
New Zealand,Oceania,43251,42755,41597,98.6
Nigeria,Africa,2153,2230,2097,68.7
Kenya,Africa,1708,1817,1838,74.5
South Africa,Africa,6374,6001,5094,77.4
Egypt,Africa,2537,3019,3569,80.2
Morocco,Africa,3227,3204,3059,78.6
";
