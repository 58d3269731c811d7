//! Chilean regions and their comunas, north to south.

/// `(region, comunas)` pairs. A region's code is its 1-based position here,
/// formatted with two digits.
pub(crate) const REGIONS: &[(&str, &[&str])] = &[
    (
        "Arica y Parinacota",
        &[
            "Arica",
            "Camarones",
            "General Lagos",
            "Putre",
        ],
    ),
    (
        "Tarapaca",
        &[
            "Alto Hospicio",
            "Camina",
            "Colchane",
            "Huara",
            "Iquique",
            "Pica",
            "Pozo Almonte",
        ],
    ),
    (
        "Antofagasta",
        &[
            "Antofagasta",
            "Calama",
            "Maria Elena",
            "Mejillones",
            "Olague",
            "San Pedro de Atacama",
            "Sierra Gorda",
            "Taltal",
            "Tocopilla",
        ],
    ),
    (
        "Atacama",
        &[
            "Alto del Carmen",
            "Caldera",
            "Chanaral",
            "Copiapo",
            "Diego de Almagro",
            "Freirina",
            "Huasco",
            "Tierra Amarilla",
            "Vallenar",
        ],
    ),
    (
        "Coquimbo",
        &[
            "Andacollo",
            "Canela",
            "Combarbala",
            "Coquimbo",
            "Illapel",
            "La Higuera",
            "La Serena",
            "Los Vilos",
            "Monte Patria",
            "Ovalle",
            "Paihuano",
            "Punitaqui",
            "Rio Hurtado",
            "Salamanca",
            "Vicuna",
        ],
    ),
    (
        "Valparaiso",
        &[
            "Algarrobo",
            "Cabildo",
            "Calera",
            "Calle Larga",
            "Cartagena",
            "Casablanca",
            "Catemu",
            "Concon",
            "El Quisco",
            "El Tabo",
            "Hijuelas",
            "Isla de Pascua",
            "Juan Fernandez",
            "La Cruz",
            "La Ligua",
            "Limache",
            "Llaillay",
            "Los Andes",
            "Nogales",
            "Olmue",
            "Panquehue",
            "Papudo",
            "Petorca",
            "Puchuncavi",
            "Putaendo",
            "Quillota",
            "Quilpue",
            "Quintero",
            "Rinconada",
            "San Antonio",
            "San Esteban",
            "San Felipe",
            "Santa Maria",
            "Santo Domingo",
            "Valparaiso",
            "Villa Alemana",
            "Vina del Mar",
            "Zapallar",
        ],
    ),
    (
        "Metropolitana",
        &[
            "Alhue",
            "Buin",
            "Calera de Tango",
            "Cerrillos",
            "Cerro Navia",
            "Colina",
            "Conchali",
            "Curacavi",
            "El Bosque",
            "El Monte",
            "Estacion Central",
            "Huechuraba",
            "Independencia",
            "Isla de Maipo",
            "La Cisterna",
            "La Florida",
            "La Granja",
            "La Pintana",
            "La Reina",
            "Lampa",
            "Las Condes",
            "Lo Barnechea",
            "Lo Espejo",
            "Lo Prado",
            "Macul",
            "Maipu",
            "Maria Pinto",
            "Melipilla",
            "Nunoa",
            "Padre Hurtado",
            "Paine",
            "Pedro Aguirre Cerda",
            "Penalolen",
            "Penaflor",
            "Pirque",
            "Providencia",
            "Pudahuel",
            "Puente Alto",
            "Quilicura",
            "Quinta Normal",
            "Recoleta",
            "Renca",
            "San Bernardo",
            "San Joaquin",
            "San Jose de Maipo",
            "San Miguel",
            "San Pedro",
            "San Ramon",
            "Santiago",
            "Talagante",
            "Tiltil",
            "Vitacura",
        ],
    ),
    (
        "O'Higgins",
        &[
            "Chimbarongo",
            "Chepica",
            "Codegua",
            "Coinco",
            "Coltauco",
            "Donihue",
            "Graneros",
            "La Estrella",
            "Las Cabras",
            "Litueche",
            "Lolol",
            "Machali",
            "Malloa",
            "Marchigue",
            "Mostazal",
            "Nancagua",
            "Navidad",
            "Olivar",
            "Palmilla",
            "Paredones",
            "Peralillo",
            "Peumo",
            "Pichidegua",
            "Pichilemu",
            "Placilla",
            "Pumanque",
            "Quinta de Tilcoco",
            "Rancagua",
            "Rengo",
            "Requinoa",
            "San Fernando",
            "San Vicente",
            "Santa Cruz",
        ],
    ),
    (
        "Maule",
        &[
            "Cauquenes",
            "Chanco",
            "Colbun",
            "Constitucion",
            "Curepto",
            "Curico",
            "Empedrado",
            "Hualane",
            "Licanten",
            "Linares",
            "Longavi",
            "Maule",
            "Molina",
            "Parral",
            "Pelarco",
            "Pelluhue",
            "Pencahue",
            "Rauco",
            "Retiro",
            "Rio Claro",
            "Romeral",
            "Sagrada Familia",
            "San Clemente",
            "San Javier",
            "San Rafael",
            "Talca",
            "Teno",
            "Vichuquen",
            "Villa Alegre",
            "Yerbas Buenas",
        ],
    ),
    (
        "Nuble",
        &[
            "Bulnes",
            "Chillan",
            "Chillan Viejo",
            "Cobquecura",
            "Coelemu",
            "Coihueco",
            "El Carmen",
            "Ninhue",
            "Niquen",
            "Pemuco",
            "Pinto",
            "Portezuelo",
            "Quillon",
            "Quirihue",
            "Ranquil",
            "San Carlos",
            "San Fabian",
            "San Ignacio",
            "San Nicolas",
            "Treguaco",
            "Yungay",
        ],
    ),
    (
        "Biobio",
        &[
            "Alto Biobio",
            "Antuco",
            "Arauco",
            "Cabrero",
            "Canete",
            "Chiguayante",
            "Concepcion",
            "Contulmo",
            "Coronel",
            "Curanilahue",
            "Florida",
            "Hualpen",
            "Hualqui",
            "Laja",
            "Lebu",
            "Los Alamos",
            "Los Angeles",
            "Lota",
            "Mulchen",
            "Nacimiento",
            "Negrete",
            "Penco",
            "Quilaco",
            "Quilleco",
            "San Pedro de la Paz",
            "San Rosendo",
            "Santa Barbara",
            "Santa Juana",
            "Talcahuano",
            "Tirua",
            "Tome",
            "Tucapel",
            "Yumbel",
        ],
    ),
    (
        "Araucania",
        &[
            "Angol",
            "Carahue",
            "Cholchol",
            "Collipulli",
            "Cunco",
            "Curacautin",
            "Curarrehue",
            "Ercilla",
            "Freire",
            "Galvarino",
            "Gorbea",
            "Lautaro",
            "Loncoche",
            "Lonquimay",
            "Los Sauces",
            "Lumaco",
            "Melipeuco",
            "Nueva Imperial",
            "Padre Las Casas",
            "Perquenco",
            "Pitrufquen",
            "Pucon",
            "Puren",
            "Renaico",
            "Saavedra",
            "Temuco",
            "Teodoro Schmidt",
            "Tolten",
            "Traiguen",
            "Victoria",
            "Vilcun",
            "Villarrica",
        ],
    ),
    (
        "Los Rios",
        &[
            "Corral",
            "Futrono",
            "La Union",
            "Lago Ranco",
            "Lanco",
            "Los Lagos",
            "Mafil",
            "Mariquina",
            "Paillaco",
            "Panguipulli",
            "Rio Bueno",
            "Valdivia",
        ],
    ),
    (
        "Los Lagos",
        &[
            "Ancud",
            "Calbuco",
            "Castro",
            "Chaiten",
            "Chonchi",
            "Cochamo",
            "Curaco de Velez",
            "Dalcahue",
            "Fresia",
            "Frutillar",
            "Futaleufu",
            "Hualaihue",
            "Llanquihue",
            "Los Muermos",
            "Maullin",
            "Osorno",
            "Palena",
            "Puerto Montt",
            "Puerto Octay",
            "Puerto Varas",
            "Puqueldon",
            "Purranque",
            "Puyehue",
            "Queilen",
            "Quellon",
            "Quemchi",
            "Quinchao",
            "Rio Negro",
            "San Juan de la Costa",
            "San Pablo",
        ],
    ),
    (
        "Aysen",
        &[
            "Aysen",
            "Chile Chico",
            "Cisnes",
            "Cochrane",
            "Coyhaique",
            "Guaitecas",
            "Lago Verde",
            "O'Higgins",
            "Rio Ibanez",
            "Tortel",
        ],
    ),
    (
        "Magallanes",
        &[
            "Antartica",
            "Cabo de Hornos",
            "Laguna Blanca",
            "Natales",
            "Porvenir",
            "Primavera",
            "Punta Arenas",
            "Rio Verde",
            "San Gregorio",
            "Timaukel",
            "Torres del Paine",
        ],
    ),
];
